use crate::config::DocumentMetadata;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, IndirectObject, ObjectBody, ObjectId};
use crate::validation::validate_pdf;
use crate::writer::PdfWriter;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Banner used when a document is built from scratch or the input has none.
pub const DEFAULT_HEADER: &str = "%PDF-1.7";

/// In-memory document: a set of indirect objects plus the page-tree lookups.
///
/// `root`, `pages_root` and `page_objects` are object numbers into `objects`,
/// never owning pointers, so renumbering only has to update numbers.
#[derive(Debug, Clone)]
pub struct Document {
    header: String,
    header_comments: Vec<String>,
    objects: BTreeMap<u32, IndirectObject>,
    root: Option<ObjectId>,
    pages_root: Option<ObjectId>,
    page_objects: Vec<ObjectId>,
    encrypt: Option<ObjectId>,
    info: Option<Dictionary>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::with_header(DEFAULT_HEADER)
    }

    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            header_comments: Vec::new(),
            objects: BTreeMap::new(),
            root: None,
            pages_root: None,
            page_objects: Vec::new(),
            encrypt: None,
            info: None,
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Version from the banner, e.g. `1.7` from `%PDF-1.7`.
    pub fn version(&self) -> Option<&str> {
        self.header
            .split_once('-')
            .map(|(_, version)| version.trim())
            .filter(|version| !version.is_empty())
    }

    pub fn header_comments(&self) -> &[String] {
        &self.header_comments
    }

    /// Attach metadata: header comments plus the trailer `/Info` dictionary.
    pub fn set_metadata(&mut self, metadata: &DocumentMetadata) {
        if metadata.is_empty() {
            return;
        }
        self.header_comments = metadata.header_comments();
        self.info = Some(metadata.to_info_dictionary());
    }

    pub fn info(&self) -> Option<&Dictionary> {
        self.info.as_ref()
    }

    pub fn set_info(&mut self, info: Option<Dictionary>) {
        self.info = info;
    }

    /// Insert an object under its own number.
    pub fn insert(&mut self, object: IndirectObject) -> Result<()> {
        let number = object.number();
        if self.objects.contains_key(&number) {
            return Err(PdfError::ObjectCollision(number));
        }
        self.objects.insert(number, object);
        Ok(())
    }

    /// Append an object under the next unused number.
    pub fn push(&mut self, dictionary: Dictionary, body: ObjectBody) -> ObjectId {
        let id = ObjectId::new(self.next_object_number(), 0);
        let object = match body {
            ObjectBody::Stream(data) => IndirectObject::stream(id, dictionary, data),
            other => IndirectObject::from_parts(id, dictionary, other),
        };
        self.objects.insert(id.number(), object);
        id
    }

    pub fn get(&self, number: u32) -> Option<&IndirectObject> {
        self.objects.get(&number)
    }

    pub fn get_mut(&mut self, number: u32) -> Option<&mut IndirectObject> {
        self.objects.get_mut(&number)
    }

    pub fn remove(&mut self, number: u32) -> Option<IndirectObject> {
        self.objects.remove(&number)
    }

    /// Objects in ascending object-number order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut IndirectObject> {
        self.objects.values_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, number: u32) -> bool {
        self.objects.contains_key(&number)
    }

    pub fn max_object_number(&self) -> u32 {
        self.objects.keys().next_back().copied().unwrap_or(0)
    }

    pub fn next_object_number(&self) -> u32 {
        self.max_object_number() + 1
    }

    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<ObjectId>) {
        self.root = root;
    }

    pub fn pages_root(&self) -> Option<ObjectId> {
        self.pages_root
    }

    pub fn set_pages_root(&mut self, pages_root: Option<ObjectId>) {
        self.pages_root = pages_root;
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_objects
    }

    pub fn set_page_ids(&mut self, pages: Vec<ObjectId>) {
        self.page_objects = pages;
    }

    pub fn page_count(&self) -> usize {
        self.page_objects.len()
    }

    pub fn encrypt(&self) -> Option<ObjectId> {
        self.encrypt
    }

    pub fn set_encrypt(&mut self, encrypt: Option<ObjectId>) {
        self.encrypt = encrypt;
    }

    pub fn catalog(&self) -> Option<&IndirectObject> {
        self.root.and_then(|id| self.get(id.number()))
    }

    pub fn pages_root_object(&self) -> Option<&IndirectObject> {
        self.pages_root.and_then(|id| self.get(id.number()))
    }

    /// Page objects in reading order; dangling ids are skipped.
    pub fn pages(&self) -> impl Iterator<Item = &IndirectObject> {
        self.page_objects
            .iter()
            .filter_map(|id| self.objects.get(&id.number()))
    }

    /// Serialize the whole document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PdfWriter::new_with_writer(Vec::new());
        writer.write_document(self)?;
        Ok(writer.into_inner())
    }

    /// Serialize, record each object's new offset, validate and write to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = PdfWriter::new_with_writer(Vec::new());
        writer.write_document(self)?;
        for (number, (position, _)) in writer.positions() {
            if let Some(object) = self.objects.get_mut(number) {
                object.offset = Some(*position);
            }
        }
        let bytes = writer.into_inner();
        validate_pdf(&bytes)?;
        std::fs::write(path.as_ref(), &bytes)?;
        debug!(
            "Saved {} objects ({} bytes) to {}",
            self.objects.len(),
            bytes.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
