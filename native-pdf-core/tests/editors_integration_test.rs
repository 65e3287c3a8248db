//! Editors and encryption working on files on disk

use native_pdf::editors::{
    attach_files, embed_attachments, embed_image_file, fill_form_fields, Attachment, ImageOptions,
    RawDocument,
};
use native_pdf::encryption::{decrypt_pdf, encrypt_pdf};
use native_pdf::{
    build_form_document, build_image_document, build_text_document, is_valid_pdf,
    merge_pdf_bytes, merge_pdf_files, page_count, parse_document, read_pdf, validate_pdf,
    write_pdf, PdfConfig, PdfError,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// SOI, SOF0 and EOI: enough for the frame header reader.
fn tiny_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 0x08];
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&[0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

fn write_text_pdf(path: &Path, text: &str) {
    let bytes = build_text_document(text, &PdfConfig::default())
        .to_bytes()
        .unwrap();
    write_pdf(path, &bytes).unwrap();
}

#[test]
fn test_merge_three_files() {
    let dir = tempdir().unwrap();
    let inputs: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            let path = dir.path().join(format!("{name}.pdf"));
            write_text_pdf(&path, name);
            path
        })
        .collect();
    let output = dir.path().join("merged.pdf");

    merge_pdf_files(&inputs, &output).unwrap();

    let bytes = read_pdf(&output).unwrap();
    assert!(is_valid_pdf(&bytes));
    assert_eq!(page_count(&bytes).unwrap(), 3);
}

#[test]
fn test_merge_needs_two_inputs() {
    let dir = tempdir().unwrap();
    let only = dir.path().join("only.pdf");
    write_text_pdf(&only, "alone");

    let result = merge_pdf_files(&[&only], dir.path().join("out.pdf"));
    assert!(matches!(result, Err(PdfError::InvalidArgument(_))));
}

#[test]
fn test_fill_then_attach_then_image() {
    let dir = tempdir().unwrap();
    let attachment = dir.path().join("data.csv");
    fs::write(&attachment, "a,b\n1,2\n").unwrap();
    let image = dir.path().join("photo.jpg");
    fs::write(&image, tiny_jpeg(400, 300)).unwrap();

    let form = build_form_document(&["Name"], &PdfConfig::default())
        .unwrap()
        .to_bytes()
        .unwrap();
    let filled = fill_form_fields(&form, [("Name", "Grace")]).unwrap();
    let attached = attach_files(&filled, &[&attachment]).unwrap();
    let output = embed_image_file(&attached, &image, &ImageOptions::default()).unwrap();

    assert!(is_valid_pdf(&output));
    let document = parse_document(&output).unwrap();
    assert_eq!(document.page_count(), 1);

    let page = document.get(3).unwrap().dictionary();
    assert!(page.get("Resources").unwrap().contains("/XObject << /Im1"));
    assert_eq!(page.get_references("Contents").len(), 2);
    assert_eq!(page.get_references("Annots").len(), 1);

    let embedded = document
        .iter()
        .find(|object| object.dictionary().get_name("Type") == Some("EmbeddedFile"))
        .unwrap();
    assert_eq!(embedded.stream_data(), Some(&b"a,b\n1,2\n"[..]));
}

#[test]
fn test_untouched_objects_stay_byte_identical() {
    let form = build_form_document(&["A", "B"], &PdfConfig::default())
        .unwrap()
        .to_bytes()
        .unwrap();
    let filled = fill_form_fields(&form, [("A", "1")]).unwrap();

    let font = b"5 0 obj\n<< /Type /Font";
    let start = |data: &[u8]| {
        data.windows(font.len())
            .position(|w| w == font)
            .unwrap()
    };
    let end = |data: &[u8], from: usize| {
        from + data[from..]
            .windows(6)
            .position(|w| w == b"endobj")
            .unwrap()
    };
    let (a, b) = (start(&form), start(&filled));
    assert_eq!(&form[a..end(&form, a)], &filled[b..end(&filled, b)]);
}

#[test]
fn test_image_missing_file() {
    let dir = tempdir().unwrap();
    let bytes = build_text_document("x", &PdfConfig::default())
        .to_bytes()
        .unwrap();
    let result = embed_image_file(&bytes, &dir.path().join("none.jpg"), &ImageOptions::default());
    assert!(matches!(result, Err(PdfError::ResourceNotFound(_))));
}

#[test]
fn test_encrypt_file_roundtrip() {
    let dir = tempdir().unwrap();
    let plain_path = dir.path().join("plain.pdf");
    let locked_path = dir.path().join("locked.pdf");
    write_text_pdf(&plain_path, "confidential");

    let plain = read_pdf(&plain_path).unwrap();
    write_pdf(&locked_path, &encrypt_pdf(&plain, "user", "owner").unwrap()).unwrap();

    let locked = read_pdf(&locked_path).unwrap();
    assert!(is_valid_pdf(&locked));
    assert!(String::from_utf8_lossy(&locked).contains("/Filter /Standard"));

    let unlocked = decrypt_pdf(&locked, "user").unwrap();
    let original = parse_document(&plain).unwrap();
    let restored = parse_document(&unlocked).unwrap();
    assert_eq!(
        restored.get(4).unwrap().stream_data(),
        original.get(4).unwrap().stream_data()
    );

    assert!(matches!(
        decrypt_pdf(&locked, "owner"),
        Err(PdfError::InvalidArgument(_))
    ));
}

#[test]
fn test_editors_reject_encrypted_input() {
    let bytes = build_form_document(&["Name"], &PdfConfig::default())
        .unwrap()
        .to_bytes()
        .unwrap();
    let locked = encrypt_pdf(&bytes, "u", "o").unwrap();
    assert!(matches!(
        fill_form_fields(&locked, [("Name", "x")]),
        Err(PdfError::StructuralPrecondition(_))
    ));
}

#[test]
fn test_fill_after_merge_keeps_attachment_with_field_marker() {
    let cover = build_text_document("cover", &PdfConfig::default())
        .to_bytes()
        .unwrap();
    let payload = b"field /T (Name) spec".to_vec();
    let cover = embed_attachments(&cover, &[Attachment::new("notes.txt", payload.clone())]).unwrap();
    let form = build_form_document(&["Document", "Name"], &PdfConfig::default())
        .unwrap()
        .to_bytes()
        .unwrap();
    let merged = merge_pdf_bytes(&cover, &form).unwrap();

    // Cover: 1-10 with the embedded file at 6. Form widgets land at 16 and 17.
    let before = parse_document(&merged).unwrap();
    assert_eq!(before.get(6).unwrap().stream_data(), Some(payload.as_slice()));
    assert_eq!(before.get(17).unwrap().dictionary().get("T"), Some("(Name)"));

    let filled = fill_form_fields(&merged, [("Name", "Ana")]).unwrap();
    let after = parse_document(&filled).unwrap();
    assert_eq!(after.get(6).unwrap().stream_data(), Some(payload.as_slice()));
    assert!(!after.contains(17));
    assert_eq!(after.get(16).unwrap().dictionary().get("T"), Some("(Document)"));
    assert_eq!(after.get(13).unwrap().dictionary().get("Annots"), Some("[16 0 R]"));
    assert_eq!(after.page_count(), 2);
}

#[test]
fn test_fill_ignores_marker_in_content_stream() {
    let mut doc = build_form_document(&["Name"], &PdfConfig::default()).unwrap();
    doc.get_mut(4)
        .unwrap()
        .set_stream_data(b"% /T (Name)\nBT ET".to_vec());
    let input = doc.to_bytes().unwrap();

    let filled = fill_form_fields(&input, [("Name", "Ana")]).unwrap();
    let parsed = parse_document(&filled).unwrap();
    assert!(!parsed.contains(6));
    let content = parsed.get(4).unwrap().stream_data().unwrap();
    assert!(content.starts_with(b"% /T (Name)\nBT ET\n"));
}

#[test]
fn test_fill_leaves_non_widget_objects_intact() {
    let mut doc = build_form_document(&["Document", "Name"], &PdfConfig::default()).unwrap();
    doc.get_mut(4)
        .unwrap()
        .set_stream_data(b"% /T (Name)\nBT ET".to_vec());
    let input = doc.to_bytes().unwrap();
    let input = embed_attachments(&input, &[Attachment::new("a.txt", b"/T (Name)".to_vec())]).unwrap();
    let filled = fill_form_fields(&input, [("Name", "Ana")]).unwrap();

    let before = RawDocument::parse(&input).unwrap();
    let after = RawDocument::parse(&filled).unwrap();
    // 3 page, 4 content, 7 widget, 8 /Fields array: the only objects a fill may touch.
    for number in (1..=before.next_object_number()).filter(|n| ![3, 4, 7, 8].contains(n)) {
        assert_eq!(before.raw(number), after.raw(number), "object {number} changed");
    }
    assert!(after.raw(7).is_none());
    assert!(after.raw(6).is_some());
}

#[test]
fn test_editor_outputs_pass_validation() {
    let form = build_form_document(&["Name"], &PdfConfig::default())
        .unwrap()
        .to_bytes()
        .unwrap();
    let filled = fill_form_fields(&form, [("Name", "x")]).unwrap();
    let attached = embed_attachments(&filled, &[Attachment::new("a.txt", b"a".to_vec())]).unwrap();
    let merged = merge_pdf_bytes(&attached, &form).unwrap();
    let locked = encrypt_pdf(&merged, "u", "o").unwrap();
    let unlocked = decrypt_pdf(&locked, "u").unwrap();

    for output in [&filled, &attached, &merged, &locked, &unlocked] {
        validate_pdf(output).unwrap();
    }
}

#[test]
fn test_image_document_builder() {
    let bytes = build_image_document("Photo", &tiny_jpeg(400, 300), &PdfConfig::default(), 0.5).unwrap();
    validate_pdf(&bytes).unwrap();

    let document = parse_document(&bytes).unwrap();
    assert_eq!(document.page_count(), 1);
    assert_eq!(document.get(3).unwrap().dictionary().get("Contents"), Some("[4 0 R 7 0 R]"));
    assert_eq!(document.get(6).unwrap().dictionary().get("Filter"), Some("/DCTDecode"));
    assert!(document.get(4).unwrap().stream_data().unwrap().ends_with(b"(Photo) Tj\nET"));

    let err = build_image_document("Photo", &tiny_jpeg(4, 3), &PdfConfig::default(), 1.5).unwrap_err();
    assert!(matches!(err, PdfError::InvalidArgument(_)));
}
