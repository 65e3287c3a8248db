//! PDF merging functionality
//!
//! The first document keeps its Catalog, Pages root, header and trailer
//! metadata. Every object of a later document is shifted past the highest
//! object number already in use and its references are rewritten in one
//! pass; its Catalog and Pages root are dropped and references to them are
//! redirected to the first document's.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::io::{read_pdf, write_pdf};
use crate::objects::ObjectId;
use crate::parser::parse_document;
use crate::validation::validate_pdf;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Page-tree anchors of a document that is about to be merged.
struct PageTree {
    root: ObjectId,
    pages_root: ObjectId,
    kids: Vec<ObjectId>,
    count: i64,
}

fn page_tree(document: &Document, label: &str) -> Result<PageTree> {
    let root = document.root().ok_or_else(|| {
        PdfError::StructuralPrecondition(format!("{label} document has no Catalog"))
    })?;
    let pages_root = document.pages_root().ok_or_else(|| {
        PdfError::StructuralPrecondition(format!("{label} document has no Pages root"))
    })?;
    let pages = document.get(pages_root.number()).ok_or_else(|| {
        PdfError::StructuralPrecondition(format!(
            "{label} document's Pages root {pages_root} is missing"
        ))
    })?;
    if document.get(root.number()).is_none() {
        return Err(PdfError::StructuralPrecondition(format!(
            "{label} document's Catalog {root} is missing"
        )));
    }

    let mut kids = pages.dictionary().get_references("Kids");
    if kids.is_empty() {
        kids = document.page_ids().to_vec();
    }
    let count = pages
        .dictionary()
        .get_integer("Count")
        .unwrap_or(document.page_count() as i64);

    Ok(PageTree {
        root,
        pages_root,
        kids,
        count,
    })
}

/// Merges any number of documents into the first one.
#[derive(Debug, Default)]
pub struct PdfMerger {
    documents: Vec<Document>,
    /// Object number mapping applied to each input after the first
    object_mappings: Vec<HashMap<u32, u32>>,
}

impl PdfMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Parse and add a document from raw bytes.
    pub fn add_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.documents.push(parse_document(data)?);
        Ok(())
    }

    /// Renumbering used for the `index`-th appended input (0 = second document).
    pub fn object_mapping(&self, index: usize) -> Option<&HashMap<u32, u32>> {
        self.object_mappings.get(index)
    }

    pub fn merge(&mut self) -> Result<Document> {
        let mut documents = std::mem::take(&mut self.documents).into_iter();
        let mut merged = documents.next().ok_or_else(|| {
            PdfError::InvalidArgument("no documents to merge".to_string())
        })?;

        self.object_mappings.clear();
        for document in documents {
            let (result, mapping) = merge_pair(&merged, &document)?;
            merged = result;
            self.object_mappings.push(mapping);
        }

        info!(
            "Merged {} documents into {} pages",
            self.object_mappings.len() + 1,
            merged.page_count()
        );
        Ok(merged)
    }
}

/// Merge `second` into `first`; pages read `first ++ second`.
pub fn merge_documents(first: &Document, second: &Document) -> Result<Document> {
    merge_pair(first, second).map(|(document, _)| document)
}

fn merge_pair(first: &Document, second: &Document) -> Result<(Document, HashMap<u32, u32>)> {
    let tree_a = page_tree(first, "first")?;
    let tree_b = page_tree(second, "second")?;
    if second.encrypt().is_some() {
        warn!("Merging an encrypted document; its streams are copied as-is");
    }

    let shift = first.max_object_number();
    debug!("Shifting second document's objects by {shift}");

    let shifted = |number: u32| {
        number.checked_add(shift).ok_or_else(|| {
            PdfError::MalformedInput(format!(
                "object number {number} cannot be shifted by {shift}"
            ))
        })
    };

    let mut mapping: HashMap<u32, u32> = HashMap::new();
    for object in second.iter() {
        mapping.insert(object.number(), shifted(object.number())?);
        // Dangling references are shifted too, so they never alias objects of `first`.
        for reference in object.references() {
            if !mapping.contains_key(&reference.number()) {
                mapping.insert(reference.number(), shifted(reference.number())?);
            }
        }
    }
    mapping.insert(tree_b.root.number(), tree_a.root.number());
    mapping.insert(tree_b.pages_root.number(), tree_a.pages_root.number());

    let mut merged = first.clone();
    for object in second.iter() {
        if object.number() == tree_b.root.number() || object.number() == tree_b.pages_root.number() {
            continue;
        }
        let mut renumbered = object.clone();
        renumbered.rewrite_references(&mapping);
        renumbered.set_number(shifted(object.number())?);
        renumbered.offset = None;
        merged.insert(renumbered)?;
    }

    let remap = |id: &ObjectId| {
        let number = mapping.get(&id.number()).copied().unwrap_or(id.number());
        ObjectId::new(number, id.generation())
    };

    let kids: Vec<String> = tree_a
        .kids
        .iter()
        .copied()
        .chain(tree_b.kids.iter().map(remap))
        .map(|id| id.to_string())
        .collect();
    let count = tree_a.count + tree_b.count;

    let pages = merged
        .get_mut(tree_a.pages_root.number())
        .ok_or_else(|| PdfError::StructuralPrecondition("Pages root vanished during merge".to_string()))?;
    pages.dictionary_mut().set("Kids", format!("[{}]", kids.join(" ")));
    pages.dictionary_mut().set("Count", count.to_string());

    let mut page_ids = first.page_ids().to_vec();
    page_ids.extend(second.page_ids().iter().map(remap));
    merged.set_page_ids(page_ids);

    debug!(
        "Merged page tree: {} kids, /Count {count}, {} objects",
        kids.len(),
        merged.len()
    );
    Ok((merged, mapping))
}

/// Merge two serialized documents and check the result.
pub fn merge_pdf_bytes(first: &[u8], second: &[u8]) -> Result<Vec<u8>> {
    let first = parse_document(first)?;
    let second = parse_document(second)?;
    let bytes = merge_documents(&first, &second)?.to_bytes()?;
    validate_pdf(&bytes)?;
    Ok(bytes)
}

/// Merge files in order and write the result to `output`.
pub fn merge_pdf_files<P: AsRef<Path>, Q: AsRef<Path>>(inputs: &[P], output: Q) -> Result<()> {
    if inputs.len() < 2 {
        return Err(PdfError::InvalidArgument(
            "at least two documents are required to merge".to_string(),
        ));
    }

    let mut merger = PdfMerger::new();
    for input in inputs {
        merger.add_bytes(&read_pdf(input)?)?;
    }
    let merged = merger.merge()?;
    let bytes = merged.to_bytes()?;
    validate_pdf(&bytes)?;
    write_pdf(output, &bytes)
}
