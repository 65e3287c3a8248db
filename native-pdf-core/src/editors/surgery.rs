//! Raw object spans of an existing file
//!
//! Editors work on the original `N G obj ... endobj` spans. Objects that an
//! edit does not touch are written back byte for byte; only the objects an
//! edit changes are re-serialized. Offsets, the xref table and the trailer
//! are always recomputed on output.

use crate::bytes::{encode_latin1, find_bytes, unescape_pdf_string};
use crate::document::DEFAULT_HEADER;
use crate::error::{PdfError, Result};
use crate::objects::{references_in, remove_reference, Dictionary, IndirectObject, ObjectBody, ObjectId};
use crate::parser::{parse_dictionary, parse_document_lenient, parse_object, scan_object_spans};
use crate::validation::validate_pdf;
use crate::writer::{assemble_raw, RawObject, TrailerInfo};
use std::collections::BTreeMap;
use tracing::debug;

/// An existing file split into raw object spans plus its page-tree anchors.
#[derive(Debug, Clone)]
pub struct RawDocument {
    header: Vec<u8>,
    objects: BTreeMap<u32, RawObject>,
    trailer: TrailerInfo,
    pages: Vec<ObjectId>,
}

impl RawDocument {
    /// Split `data` into spans. Fails when no Catalog or page can be found.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let structure = parse_document_lenient(data);
        let root = structure.root().ok_or_else(|| {
            PdfError::MalformedInput("no Catalog object could be located".to_string())
        })?;
        if structure.encrypt().is_some() {
            return Err(PdfError::StructuralPrecondition(
                "encrypted documents cannot be edited".to_string(),
            ));
        }

        let spans = scan_object_spans(data);
        let header = match spans.first() {
            Some(first) if data[..first.start].starts_with(b"%PDF-") => data[..first.start].to_vec(),
            _ => format!("{DEFAULT_HEADER}\n").into_bytes(),
        };

        let mut objects = BTreeMap::new();
        for span in &spans {
            objects.insert(
                span.id.number(),
                RawObject {
                    id: span.id,
                    bytes: span.bytes(data).to_vec(),
                },
            );
        }
        debug!("Split input into {} raw objects", objects.len());

        Ok(Self {
            header,
            objects,
            trailer: TrailerInfo {
                root: Some(root),
                encrypt: None,
                info: structure.info().cloned(),
            },
            pages: structure.page_ids().to_vec(),
        })
    }

    pub fn root(&self) -> Option<ObjectId> {
        self.trailer.root
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.pages
    }

    pub fn first_page(&self) -> Result<ObjectId> {
        self.pages.first().copied().ok_or_else(|| {
            PdfError::StructuralPrecondition("document has no pages".to_string())
        })
    }

    pub fn contains(&self, number: u32) -> bool {
        self.objects.contains_key(&number)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn next_object_number(&self) -> u32 {
        self.objects.keys().next_back().copied().unwrap_or(0) + 1
    }

    pub fn raw(&self, number: u32) -> Option<&[u8]> {
        self.objects.get(&number).map(|object| object.bytes.as_slice())
    }

    /// Parsed view of one span.
    pub fn object(&self, number: u32) -> Option<IndirectObject> {
        let raw = self.objects.get(&number)?;
        let span = scan_object_spans(&raw.bytes).into_iter().next()?;
        Some(parse_object(&raw.bytes, &span))
    }

    pub fn require_object(&self, number: u32) -> Result<IndirectObject> {
        self.object(number).ok_or_else(|| {
            PdfError::StructuralPrecondition(format!("object {number} is missing"))
        })
    }

    /// First widget or field dictionary, in number order, whose `/T` is
    /// `name`. Streams never match, whatever their payload holds.
    pub fn find_field_widget(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .values()
            .filter(|object| find_bytes(&object.bytes, b"/T", 0).is_some())
            .filter_map(|object| self.object(object.id.number()))
            .find(|object| is_field_widget(object, name))
            .map(|object| object.id())
    }

    /// Re-serialize `object` in place of its span.
    pub fn replace(&mut self, object: &IndirectObject) {
        self.objects.insert(
            object.number(),
            RawObject {
                id: object.id(),
                bytes: object.to_bytes(),
            },
        );
    }

    /// Append a new object under the next free number.
    pub fn append(&mut self, build: impl FnOnce(ObjectId) -> IndirectObject) -> ObjectId {
        let id = ObjectId::new(self.next_object_number(), 0);
        let object = build(id);
        self.replace(&object);
        id
    }

    /// Drop a span; its number becomes a free xref entry on output.
    pub fn remove(&mut self, number: u32) -> Option<RawObject> {
        self.objects.remove(&number)
    }

    /// Remove `id` from every `/Annots` and `/Fields` array, whether the
    /// array sits in a dictionary or is an object of its own.
    pub fn drop_from_arrays(&mut self, id: ObjectId) {
        let needle = encode_latin1(&id.to_string());
        let candidates: Vec<u32> = self
            .objects
            .values()
            .filter(|object| find_bytes(&object.bytes, &needle, 0).is_some())
            .map(|object| object.id.number())
            .collect();

        for number in candidates {
            let Some(mut object) = self.object(number) else {
                continue;
            };
            let mut changed = false;
            for key in ["Annots", "Fields"] {
                if let Some(value) = object.dictionary().get(key).map(str::to_string) {
                    if value.trim_start().starts_with('[') {
                        let updated = remove_reference(&value, id.number(), id.generation());
                        if updated != value {
                            object.dictionary_mut().set(key, updated);
                            changed = true;
                        }
                    }
                }
            }
            if let ObjectBody::Inline(text) = object.body().clone() {
                if text.trim_start().starts_with('[') {
                    let updated = remove_reference(&text, id.number(), id.generation());
                    if updated != text {
                        object = IndirectObject::from_parts(
                            object.id(),
                            object.dictionary().clone(),
                            ObjectBody::Inline(updated),
                        );
                        changed = true;
                    }
                }
            }
            if changed {
                debug!("Removed {id} from arrays in object {number}");
                self.replace(&object);
            }
        }
    }

    /// A dictionary value that is either inline (`<< ... >>`) or a reference
    /// to a dictionary object.
    pub fn resolve_dictionary(&self, value: &str) -> Option<Dictionary> {
        let value = value.trim();
        if value.starts_with("<<") {
            return Some(parse_dictionary(&encode_latin1(value)));
        }
        let id = ObjectId::parse_reference(value)?;
        self.object(id.number()).map(|object| object.dictionary().clone())
    }

    /// Name of the first font in a page's `/Resources /Font` map.
    pub fn first_font_name(&self, page: &IndirectObject) -> Option<String> {
        let resources = self.resolve_dictionary(page.dictionary().get("Resources")?)?;
        let fonts = self.resolve_dictionary(resources.get("Font")?)?;
        let first = fonts.keys().next().cloned();
        first
    }

    /// A page attribute, looked up on the page and then on its `/Parent`
    /// chain.
    pub fn inherited_value(&self, page: &IndirectObject, key: &str) -> Option<String> {
        if let Some(value) = page.dictionary().get(key) {
            return Some(value.to_string());
        }
        let mut visited = vec![page.number()];
        let mut parent = page.dictionary().get_reference("Parent");
        while let Some(id) = parent {
            if visited.contains(&id.number()) {
                debug!("Parent cycle at {id} while looking up /{key}");
                return None;
            }
            visited.push(id.number());
            let node = self.object(id.number())?;
            if let Some(value) = node.dictionary().get(key) {
                return Some(value.to_string());
            }
            parent = node.dictionary().get_reference("Parent");
        }
        None
    }

    /// Content stream references of a page, following `/Contents` into an
    /// array object when it points at one.
    pub fn content_refs(&self, page: &IndirectObject) -> Vec<ObjectId> {
        let Some(value) = page.dictionary().get("Contents") else {
            return Vec::new();
        };
        match self.contents_array_object(value) {
            Some(array) => array.inline_text().map(references_in).unwrap_or_default(),
            None => references_in(value),
        }
    }

    /// Add `stream` to the end of the page's content. An array object behind
    /// `/Contents` is extended in place; otherwise the page entry is updated.
    /// Returns whether `page` itself changed.
    pub fn push_content(&mut self, page: &mut IndirectObject, stream: ObjectId) -> bool {
        let current = page.dictionary().get("Contents").map(|v| v.trim().to_string());
        let value = match current {
            Some(array) if array.starts_with('[') => append_to_array(&array, &stream.to_string()),
            Some(single) if !single.is_empty() => {
                if let Some(array) = self.contents_array_object(&single) {
                    let text = array.inline_text().unwrap_or("[]").to_string();
                    let updated = IndirectObject::inline(array.id(), append_to_array(&text, &stream.to_string()));
                    self.replace(&updated);
                    return false;
                }
                format!("[{single} {stream}]")
            }
            _ => stream.to_string(),
        };
        page.dictionary_mut().set("Contents", value);
        true
    }

    fn contents_array_object(&self, value: &str) -> Option<IndirectObject> {
        ObjectId::parse_reference(value.trim())
            .and_then(|id| self.object(id.number()))
            .filter(|object| object.inline_text().is_some_and(|t| t.trim_start().starts_with('[')))
    }

    /// Serialize and run the structural checks on the result.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let objects: Vec<RawObject> = self.objects.values().cloned().collect();
        let output = assemble_raw(&self.header, &objects, &self.trailer)?;
        validate_pdf(&output)?;
        Ok(output)
    }
}

fn is_field_widget(object: &IndirectObject, name: &str) -> bool {
    if object.is_stream() {
        return false;
    }
    let dict = object.dictionary();
    let is_widget = dict.get_name("Subtype") == Some("Widget") || dict.contains_key("FT");
    is_widget && dict.get("T").and_then(literal_string).as_deref() == Some(name)
}

fn literal_string(value: &str) -> Option<String> {
    let inner = value.trim().strip_prefix('(')?.strip_suffix(')')?;
    Some(unescape_pdf_string(inner))
}

/// Insert `refs` before the closing bracket of `array`.
pub(crate) fn append_to_array(array: &str, refs: &str) -> String {
    let body = array.trim().trim_end_matches(']').trim_end();
    if body == "[" {
        format!("[{refs}]")
    } else {
        format!("{body} {refs}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_form_document;
    use crate::config::PdfConfig;

    fn form_bytes() -> Vec<u8> {
        build_form_document(&["Document", "Name"], &PdfConfig::default())
            .unwrap()
            .to_bytes()
            .unwrap()
    }

    #[test]
    fn test_parse_keeps_spans_verbatim() {
        let data = form_bytes();
        let raw = RawDocument::parse(&data).unwrap();
        assert_eq!(raw.len(), 9);
        assert_eq!(raw.root(), Some(ObjectId::new(1, 0)));
        assert_eq!(raw.first_page().unwrap(), ObjectId::new(3, 0));

        let span = raw.raw(6).unwrap();
        assert!(find_bytes(&data, span, 0).is_some());
        assert!(raw.to_bytes().unwrap().starts_with(b"%PDF-1.7\n"));
    }

    #[test]
    fn test_find_field_widget() {
        let raw = RawDocument::parse(&form_bytes()).unwrap();
        assert_eq!(raw.find_field_widget("Name"), Some(ObjectId::new(7, 0)));
        assert_eq!(raw.find_field_widget("Other"), None);
    }

    #[test]
    fn test_find_field_widget_skips_streams_and_other_annotations() {
        let mut doc = build_form_document(&["Name"], &PdfConfig::default()).unwrap();
        doc.get_mut(4)
            .unwrap()
            .set_stream_data(b"% /T (Name)\nBT ET".to_vec());
        let data = doc.to_bytes().unwrap();
        let raw = RawDocument::parse(&data).unwrap();
        assert_eq!(raw.find_field_widget("Name"), Some(ObjectId::new(6, 0)));

        doc.remove(6);
        let mut note = Dictionary::new();
        note.set("Type", "/Annot");
        note.set("Subtype", "/FileAttachment");
        note.set("T", "(Name)");
        doc.push(note, ObjectBody::Empty);
        let raw = RawDocument::parse(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(raw.find_field_widget("Name"), None);
    }

    #[test]
    fn test_inherited_value_walks_parents() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        let mut page = raw.object(3).unwrap();
        let media_box = page.dictionary_mut().remove("MediaBox").unwrap();
        raw.replace(&page);
        let mut pages = raw.object(2).unwrap();
        pages.dictionary_mut().set("MediaBox", media_box.clone());
        raw.replace(&pages);

        assert_eq!(raw.inherited_value(&page, "MediaBox"), Some(media_box));
        assert_eq!(raw.inherited_value(&page, "CropBox"), None);
    }

    #[test]
    fn test_push_content_extends_indirect_array() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        let array = raw.append(|id| IndirectObject::inline(id, "[4 0 R]"));
        let mut page = raw.object(3).unwrap();
        page.dictionary_mut().set("Contents", array.to_string());
        raw.replace(&page);
        assert_eq!(raw.content_refs(&page), vec![ObjectId::new(4, 0)]);

        let stream = raw.append(|id| IndirectObject::stream(id, Dictionary::new(), b"q Q".to_vec()));
        assert!(!raw.push_content(&mut page, stream));
        assert_eq!(page.dictionary().get("Contents"), Some("10 0 R"));
        assert_eq!(raw.object(10).unwrap().inline_text(), Some("[4 0 R 11 0 R]"));
    }

    #[test]
    fn test_push_content_wraps_single_stream() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        let mut page = raw.object(3).unwrap();
        assert!(raw.push_content(&mut page, ObjectId::new(10, 0)));
        assert_eq!(page.dictionary().get("Contents"), Some("[4 0 R 10 0 R]"));
    }

    #[test]
    fn test_append_to_array() {
        assert_eq!(append_to_array("[]", "9 0 R"), "[9 0 R]");
        assert_eq!(append_to_array("[ ]", "9 0 R"), "[9 0 R]");
        assert_eq!(append_to_array("[6 0 R]", "9 0 R"), "[6 0 R 9 0 R]");
    }

    #[test]
    fn test_append_uses_next_number() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        let id = raw.append(|id| IndirectObject::new(id, Dictionary::new()));
        assert_eq!(id, ObjectId::new(10, 0));
        assert!(raw.contains(10));
    }

    #[test]
    fn test_drop_from_arrays() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        raw.remove(6);
        raw.drop_from_arrays(ObjectId::new(6, 0));

        let page = raw.object(3).unwrap();
        assert_eq!(page.dictionary().get("Annots"), Some("[7 0 R]"));
        let fields = raw.object(8).unwrap();
        assert_eq!(fields.inline_text(), Some("[7 0 R]"));
    }

    #[test]
    fn test_removed_number_becomes_free_entry() {
        let mut raw = RawDocument::parse(&form_bytes()).unwrap();
        raw.remove(6);
        let text = crate::bytes::decode_latin1(&raw.to_bytes().unwrap());
        let xref = &text[text.find("xref\n").unwrap()..];
        let entries: Vec<&str> = xref.lines().skip(2).take(10).collect();
        assert_eq!(entries[6], "0000000000 00000 f ");
    }

    #[test]
    fn test_first_font_name() {
        let raw = RawDocument::parse(&form_bytes()).unwrap();
        let page = raw.object(3).unwrap();
        assert_eq!(raw.first_font_name(&page).as_deref(), Some("F1"));
    }

    #[test]
    fn test_resolve_dictionary_through_reference() {
        let raw = RawDocument::parse(&form_bytes()).unwrap();
        let font = raw.resolve_dictionary("5 0 R").unwrap();
        assert_eq!(font.get_name("Subtype"), Some("Type1"));
        assert!(raw.resolve_dictionary("[1 2]").is_none());
    }

    #[test]
    fn test_encrypted_input_is_rejected() {
        let data = crate::encryption::encrypt_pdf(&form_bytes(), "user", "owner").unwrap();
        assert!(matches!(
            RawDocument::parse(&data),
            Err(PdfError::StructuralPrecondition(_))
        ));
    }
}
