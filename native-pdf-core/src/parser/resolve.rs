//! Catalog, page-tree root and page list resolution
//!
//! Each lookup tries a chain of methods and stops at the first that succeeds.
//! Later methods exist only to recover documents whose dictionaries did not
//! split cleanly.

use crate::document::Document;
use crate::objects::{references_in, Dictionary, ObjectId, ObjectRole};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

lazy_static! {
    static ref CATALOG_TEXT_RE: Regex = Regex::new(r"/Type\s*/Catalog\b").unwrap();
    static ref PAGES_TEXT_RE: Regex = Regex::new(r"/Type\s*/Pages\b").unwrap();
    static ref KIDS_TEXT_RE: Regex = Regex::new(r"/Kids\s*\[([^\]]*)\]").unwrap();
}

/// Raw Latin-1 text of every object span, keyed by object number.
pub type RawTexts = BTreeMap<u32, String>;

fn id_of(document: &Document, number: u32) -> Option<ObjectId> {
    document.get(number).map(|object| object.id())
}

pub fn resolve_catalog(
    document: &Document,
    raw: &RawTexts,
    trailer: Option<&Dictionary>,
) -> Option<ObjectId> {
    if let Some(object) = document.iter().find(|o| o.role() == ObjectRole::Catalog) {
        debug!("Catalog found by /Type: object {}", object.number());
        return Some(object.id());
    }

    if let Some((&number, _)) = raw.iter().find(|(_, text)| CATALOG_TEXT_RE.is_match(text)) {
        if let Some(id) = id_of(document, number) {
            debug!("Catalog found by text search: object {number}");
            return Some(id);
        }
    }

    if let Some(root) = trailer.and_then(|t| t.get_reference("Root")) {
        if let Some(id) = id_of(document, root.number()) {
            debug!("Catalog found by trailer /Root: object {}", root.number());
            return Some(id);
        }
    }

    let guess = document.iter().find(|o| {
        o.dictionary().contains_key("Pages") && o.dictionary().contains_key("Type")
    })?;
    debug!("Catalog guessed from structure: object {}", guess.number());
    Some(guess.id())
}

pub fn resolve_pages_root(
    document: &Document,
    raw: &RawTexts,
    catalog: Option<ObjectId>,
) -> Option<ObjectId> {
    let from_catalog = catalog
        .and_then(|id| document.get(id.number()))
        .and_then(|catalog| catalog.dictionary().get_reference("Pages"))
        .and_then(|pages| id_of(document, pages.number()));
    if let Some(id) = from_catalog {
        debug!("Pages root found by Catalog /Pages: object {}", id.number());
        return Some(id);
    }

    let typed: Vec<_> = document
        .iter()
        .filter(|o| o.role() == ObjectRole::Pages)
        .collect();
    let top = typed
        .iter()
        .find(|o| !o.dictionary().contains_key("Parent"))
        .or_else(|| typed.first());
    if let Some(object) = top {
        debug!("Pages root found by /Type: object {}", object.number());
        return Some(object.id());
    }

    let (&number, _) = raw.iter().find(|(_, text)| PAGES_TEXT_RE.is_match(text))?;
    debug!("Pages root found by text search: object {number}");
    id_of(document, number)
}

/// Page objects in reading order.
pub fn resolve_page_objects(
    document: &Document,
    raw: &RawTexts,
    pages_root: Option<ObjectId>,
) -> Vec<ObjectId> {
    if let Some(root) = pages_root {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        collect_kids(document, root, &mut pages, &mut visited);
        if !pages.is_empty() {
            return pages;
        }

        let from_text: Vec<ObjectId> = raw
            .get(&root.number())
            .and_then(|text| KIDS_TEXT_RE.captures(text))
            .map(|caps| references_in(&caps[1]))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| id_of(document, id.number()))
            .collect();
        if !from_text.is_empty() {
            debug!("Kids recovered by text search on object {}", root.number());
            return from_text;
        }
    }

    let pages: Vec<ObjectId> = document
        .iter()
        .filter(|o| o.role() == ObjectRole::Page)
        .map(|o| o.id())
        .collect();
    if !pages.is_empty() {
        debug!("Pages found by direct /Type /Page search: {}", pages.len());
    }
    pages
}

fn collect_kids(
    document: &Document,
    node: ObjectId,
    pages: &mut Vec<ObjectId>,
    visited: &mut HashSet<u32>,
) {
    if !visited.insert(node.number()) {
        warn!("Cycle in page tree at object {}", node.number());
        return;
    }
    let Some(object) = document.get(node.number()) else {
        return;
    };

    for kid in object.dictionary().get_references("Kids") {
        match document.get(kid.number()) {
            Some(child) if child.role() == ObjectRole::Pages => {
                collect_kids(document, child.id(), pages, visited);
            }
            Some(child) => pages.push(child.id()),
            None => warn!("Page tree references missing object {}", kid.number()),
        }
    }
}
