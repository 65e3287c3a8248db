//! Read-only queries over serialized documents

use crate::bytes::{decode_latin1, unescape_pdf_string};
use crate::error::Result;
use crate::parser::parse_document;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref FIELD_NAME_RE: Regex = Regex::new(r"/T\s*\(((?:[^()\\]|\\.)*)\)").unwrap();
}

/// Number of pages reachable from the page tree.
pub fn page_count(data: &[u8]) -> Result<usize> {
    Ok(parse_document(data)?.page_count())
}

/// Every `/T (name)` in file order.
pub fn form_field_names(data: &[u8]) -> Vec<String> {
    let text = decode_latin1(data);
    FIELD_NAME_RE
        .captures_iter(&text)
        .map(|caps| unescape_pdf_string(&caps[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_form_document, build_text_document};
    use crate::config::PdfConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_page_count_of_built_document() {
        let bytes = build_text_document("x", &PdfConfig::default())
            .to_bytes()
            .unwrap();
        assert_eq!(page_count(&bytes).unwrap(), 1);
    }

    #[test]
    fn test_page_count_of_garbage_fails() {
        assert!(page_count(b"not a pdf").is_err());
    }

    #[test]
    fn test_form_field_names_in_order() {
        let bytes = build_form_document(&["Document", "Name", "a (b)"], &PdfConfig::default())
            .unwrap()
            .to_bytes()
            .unwrap();
        assert_eq!(
            form_field_names(&bytes),
            vec!["Document".to_string(), "Name".to_string(), "a (b)".to_string()]
        );
    }

    #[test]
    fn test_no_fields() {
        assert!(form_field_names(b"%PDF-1.7\n%%EOF").is_empty());
    }
}
