//! Tokenizing parser
//!
//! Turns raw file bytes into a [`Document`]. Objects are located by span
//! scanning, not by following the xref table, so files with stale or broken
//! offsets still load.

pub mod header;
pub mod resolve;
pub mod tokenizer;

pub use header::PdfHeader;
pub use tokenizer::{find_dictionary_end, parse_dictionary, parse_object, parse_trailer, scan_object_spans, ObjectSpan};

use crate::bytes::{decode_latin1, encode_latin1};
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::Dictionary;
use resolve::{resolve_catalog, resolve_page_objects, resolve_pages_root, RawTexts};
use tracing::{debug, warn};

/// Parse and require a Catalog plus a Pages root.
pub fn parse_document(data: &[u8]) -> Result<Document> {
    let document = parse_document_lenient(data);
    if document.root().is_none() {
        return Err(PdfError::MalformedInput(
            "no Catalog object could be located".to_string(),
        ));
    }
    if document.pages_root().is_none() {
        return Err(PdfError::MalformedInput(
            "no Pages root could be located".to_string(),
        ));
    }
    Ok(document)
}

/// Parse whatever structure can be recovered. `root` and `pages_root` may be
/// unset on the returned document.
pub fn parse_document_lenient(data: &[u8]) -> Document {
    let header = PdfHeader::parse(data);
    if !header.found {
        warn!("Missing %PDF- header, assuming {}", header.banner);
    }
    let mut document = Document::with_header(header.banner);

    let mut raw = RawTexts::new();
    for span in scan_object_spans(data) {
        let object = parse_object(data, &span);
        if document.remove(span.id.number()).is_some() {
            debug!("Object {} redefined, keeping the later copy", span.id.number());
        }
        raw.insert(span.id.number(), decode_latin1(span.bytes(data)));
        // Number is free after the remove above.
        let _ = document.insert(object);
    }
    debug!("Parsed {} objects", document.len());

    let trailer = parse_trailer(data);
    if let Some(trailer) = &trailer {
        if let Some(encrypt) = trailer.get_reference("Encrypt") {
            warn!("Input is encrypted (/Encrypt {encrypt}); stream payloads are kept as-is");
            document.set_encrypt(Some(encrypt));
        }
        document.set_info(trailer_info(&document, trailer));
    }

    let catalog = resolve_catalog(&document, &raw, trailer.as_ref());
    let pages_root = resolve_pages_root(&document, &raw, catalog);
    let pages = resolve_page_objects(&document, &raw, pages_root);

    document.set_root(catalog);
    document.set_pages_root(pages_root);
    document.set_page_ids(pages);
    document
}

/// Trailer `/Info`, either inline or resolved from its object.
fn trailer_info(document: &Document, trailer: &Dictionary) -> Option<Dictionary> {
    let value = trailer.get("Info")?;
    if value.trim_start().starts_with("<<") {
        return Some(parse_dictionary(&encode_latin1(value)));
    }
    let id = trailer.get_reference("Info")?;
    document.get(id.number()).map(|info| info.dictionary().clone())
}
