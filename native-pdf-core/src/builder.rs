//! Builders for fresh documents
//!
//! Both builders produce the fixed one-page layout that the editors in
//! [`crate::editors`] know how to work with: Catalog 1, Pages 2, Page 3,
//! content stream 4 and a Type1 font 5. Form documents append their widgets,
//! a Fields array and the AcroForm after the font. The image builder draws a
//! JPEG centred over the text page.

use crate::bytes::{encode_latin1, escape_pdf_string, format_real};
use crate::config::PdfConfig;
use crate::document::Document;
use crate::editors::{embed_image, ImageOptions};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, ObjectBody, ObjectId};
use tracing::info;

/// Left edge of the field labels.
const LABEL_X: f64 = 50.0;
/// Baseline of the first field label; each further label sits 50pt lower.
const FIRST_LABEL_Y: f64 = 160.0;
/// Widget rectangles are `[130 y 350 y+20]`, the first at `y = 150`.
const WIDGET_X: f64 = 130.0;
const WIDGET_WIDTH: f64 = 220.0;
const WIDGET_HEIGHT: f64 = 20.0;
const FIRST_WIDGET_Y: f64 = 150.0;
const FIELD_SPACING: f64 = 50.0;

fn dict(entries: &[(&str, String)]) -> Dictionary {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn media_box(width: f64, height: f64) -> String {
    format!("[0 0 {} {}]", format_real(width), format_real(height))
}

fn font_dictionary(config: &PdfConfig) -> Dictionary {
    dict(&[
        ("Type", "/Font".to_string()),
        ("Subtype", "/Type1".to_string()),
        ("BaseFont", format!("/{}", config.font_name)),
    ])
}

fn new_document(config: &PdfConfig) -> Document {
    let mut document = Document::new();
    if let Some(metadata) = &config.metadata {
        document.set_metadata(metadata);
    }
    document
}

fn finish(document: &mut Document, catalog: ObjectId, pages: ObjectId, page: ObjectId) {
    document.set_root(Some(catalog));
    document.set_pages_root(Some(pages));
    document.set_page_ids(vec![page]);
}

/// One page drawing `text` at the top-left margin.
///
/// The MediaBox is the page size minus the margins.
pub fn build_text_document(text: &str, config: &PdfConfig) -> Document {
    let (page_width, page_height) = config.page_dimensions();
    let width = page_width - config.margins.left - config.margins.right;
    let height = page_height - config.margins.top - config.margins.bottom;

    let start_x = config.margins.left;
    let start_y = height - config.margins.top;
    let content = format!(
        "BT\n{} {} TD\n/F1 {} Tf\n({}) Tj\nET",
        format_real(start_x),
        format_real(start_y),
        format_real(config.font_size),
        escape_pdf_string(text)
    );

    let mut document = new_document(config);
    let catalog = document.push(
        dict(&[
            ("Type", "/Catalog".to_string()),
            ("Pages", "2 0 R".to_string()),
        ]),
        ObjectBody::Empty,
    );
    let pages = document.push(
        dict(&[
            ("Type", "/Pages".to_string()),
            ("Kids", "[3 0 R]".to_string()),
            ("Count", "1".to_string()),
        ]),
        ObjectBody::Empty,
    );
    let page = document.push(
        dict(&[
            ("Type", "/Page".to_string()),
            ("Parent", pages.to_string()),
            ("MediaBox", media_box(width, height)),
            ("Contents", "4 0 R".to_string()),
            ("Resources", "<< /Font << /F1 5 0 R >> >>".to_string()),
        ]),
        ObjectBody::Empty,
    );
    document.push(Dictionary::new(), ObjectBody::Stream(encode_latin1(&content)));
    document.push(font_dictionary(config), ObjectBody::Empty);

    finish(&mut document, catalog, pages, page);
    info!("Built text document with {} objects", document.len());
    document
}

/// One page with a labelled text field per name, plus the AcroForm.
pub fn build_form_document(fields: &[&str], config: &PdfConfig) -> Result<Document> {
    if fields.is_empty() {
        return Err(PdfError::InvalidArgument(
            "at least one form field name is required".to_string(),
        ));
    }

    let (width, height) = config.page_dimensions();
    let first_widget = 6u32;
    let field_count = u32::try_from(fields.len())
        .map_err(|_| PdfError::InvalidArgument("too many form fields".to_string()))?;
    let fields_array = first_widget + field_count;
    let acroform = fields_array + 1;

    let widget_refs: Vec<String> = (0..field_count)
        .map(|i| ObjectId::new(first_widget + i, 0).to_string())
        .collect();
    let widget_refs = widget_refs.join(" ");

    let mut labels = String::new();
    let mut label_y = FIRST_LABEL_Y;
    for field in fields {
        labels.push_str(&format!(
            "BT /F1 {} Tf {} {} Td ({}:) Tj ET\n",
            format_real(config.font_size),
            format_real(LABEL_X),
            format_real(label_y),
            escape_pdf_string(field)
        ));
        label_y -= FIELD_SPACING;
    }

    let mut document = new_document(config);
    let catalog = document.push(
        dict(&[
            ("Type", "/Catalog".to_string()),
            ("Pages", "2 0 R".to_string()),
            ("AcroForm", ObjectId::new(acroform, 0).to_string()),
        ]),
        ObjectBody::Empty,
    );
    let pages = document.push(
        dict(&[
            ("Type", "/Pages".to_string()),
            ("Kids", "[3 0 R]".to_string()),
            ("Count", "1".to_string()),
        ]),
        ObjectBody::Empty,
    );
    let page = document.push(
        dict(&[
            ("Type", "/Page".to_string()),
            ("Parent", pages.to_string()),
            ("MediaBox", media_box(width, height)),
            ("Contents", "4 0 R".to_string()),
            ("Resources", "<< /Font << /F1 5 0 R >> >>".to_string()),
            ("Annots", format!("[{widget_refs}]")),
        ]),
        ObjectBody::Empty,
    );
    document.push(Dictionary::new(), ObjectBody::Stream(encode_latin1(&labels)));
    document.push(font_dictionary(config), ObjectBody::Empty);

    let mut widget_y = FIRST_WIDGET_Y;
    for field in fields {
        document.push(
            dict(&[
                ("Type", "/Annot".to_string()),
                ("Subtype", "/Widget".to_string()),
                (
                    "Rect",
                    format!(
                        "[{} {} {} {}]",
                        format_real(WIDGET_X),
                        format_real(widget_y),
                        format_real(WIDGET_X + WIDGET_WIDTH),
                        format_real(widget_y + WIDGET_HEIGHT)
                    ),
                ),
                ("FT", "/Tx".to_string()),
                ("T", format!("({})", escape_pdf_string(field))),
                ("F", "4".to_string()),
                ("V", "()".to_string()),
                ("DA", "(/F1 12 Tf 0 g)".to_string()),
                ("P", page.to_string()),
            ]),
            ObjectBody::Empty,
        );
        widget_y -= FIELD_SPACING;
    }

    document.push(
        Dictionary::new(),
        ObjectBody::Inline(format!("[{widget_refs}]")),
    );
    document.push(
        dict(&[("Fields", ObjectId::new(fields_array, 0).to_string())]),
        ObjectBody::Empty,
    );

    finish(&mut document, catalog, pages, page);
    info!("Built form document with {} fields", fields.len());
    Ok(document)
}

/// One text page with a JPEG drawn centred on it, at `scale` of the
/// largest size that fits.
pub fn build_image_document(text: &str, image: &[u8], config: &PdfConfig, scale: f64) -> Result<Vec<u8>> {
    let base = build_text_document(text, config).to_bytes()?;
    let options = ImageOptions {
        scale,
        page_index: 0,
    };
    let bytes = embed_image(&base, image, &options)?;
    info!("Built image document ({} bytes)", bytes.len());
    Ok(bytes)
}
