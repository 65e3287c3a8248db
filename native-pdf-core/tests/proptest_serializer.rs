//! Property-based tests for the serializer, parser and reference rewriting

use native_pdf::bytes::find_bytes;
use native_pdf::objects::{references_in, rewrite_references};
use native_pdf::{build_text_document, merge_documents, parse_document, Document, PdfConfig};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

/// `(number, offset, generation)` for every in-use xref entry.
fn xref_entries(bytes: &[u8]) -> Vec<(u32, usize, u16)> {
    let marker = b"startxref\n";
    let start = bytes
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("startxref present")
        + marker.len();
    let end = find_bytes(bytes, b"\n", start).expect("startxref value");
    let xref: usize = std::str::from_utf8(&bytes[start..end])
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!(bytes[xref..].starts_with(b"xref\n0 "));

    let text = String::from_utf8_lossy(&bytes[xref..]).into_owned();
    let mut lines = text.lines().skip(1);
    let size: u32 = lines
        .next()
        .unwrap()
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();

    lines
        .take(size as usize)
        .enumerate()
        .filter(|(_, line)| line.trim_end().ends_with('n'))
        .map(|(number, line)| {
            let mut parts = line.split_whitespace();
            let offset = parts.next().unwrap().parse().unwrap();
            let generation = parts.next().unwrap().parse().unwrap();
            (number as u32, offset, generation)
        })
        .collect()
}

fn assert_offsets_exact(bytes: &[u8], document: &Document) {
    let entries = xref_entries(bytes);
    assert_eq!(entries.len(), document.len());
    for (number, offset, generation) in entries {
        let expected = format!("{number} {generation} obj");
        assert!(
            bytes[offset..].starts_with(expected.as_bytes()),
            "object {number} not at offset {offset}"
        );
    }
}

fn document_strategy() -> impl Strategy<Value = Document> {
    ("[a-zA-Z ,.()]{0,80}", 6.0f64..36.0).prop_map(|(text, font_size)| {
        let config = PdfConfig {
            font_size,
            ..PdfConfig::default()
        };
        build_text_document(&text, &config)
    })
}

proptest! {
    #[test]
    fn xref_offsets_point_at_objects(document in document_strategy()) {
        let bytes = document.to_bytes().unwrap();
        assert_offsets_exact(&bytes, &document);
        prop_assert!(bytes.ends_with(b"%%EOF"));
    }

    #[test]
    fn reparse_keeps_page_tree(document in document_strategy()) {
        let bytes = document.to_bytes().unwrap();
        let parsed = parse_document(&bytes).unwrap();
        prop_assert_eq!(parsed.page_count(), document.page_count());
        prop_assert_eq!(parsed.root(), document.root());
        prop_assert_eq!(parsed.pages_root(), document.pages_root());
        prop_assert_eq!(parsed.len(), document.len());
    }

    #[test]
    fn merge_adds_page_counts(first in document_strategy(), second in document_strategy()) {
        let merged = merge_documents(&first, &second).unwrap();
        prop_assert_eq!(merged.page_count(), first.page_count() + second.page_count());

        let bytes = merged.to_bytes().unwrap();
        assert_offsets_exact(&bytes, &merged);
        let reparsed = parse_document(&bytes).unwrap();
        prop_assert_eq!(reparsed.page_count(), 2);
    }

    #[test]
    fn merge_leaves_no_dangling_references(first in document_strategy(), second in document_strategy()) {
        let merged = merge_documents(&first, &second).unwrap();
        for object in merged.iter() {
            for reference in object.references() {
                prop_assert!(
                    merged.contains(reference.number()),
                    "object {} references missing {}", object.number(), reference
                );
            }
        }
    }

    #[test]
    fn rewrite_is_simultaneous(numbers in prop::collection::vec(1u32..50, 1..10), shift in 1u32..50) {
        let text = numbers
            .iter()
            .map(|n| format!("{n} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        let map: HashMap<u32, u32> = numbers.iter().map(|&n| (n, n + shift)).collect();

        let rewritten = rewrite_references(&text, &map);
        let found: Vec<u32> = references_in(&rewritten).iter().map(|id| id.number()).collect();
        let expected: Vec<u32> = numbers.iter().map(|n| n + shift).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn rewrite_ignores_unmapped(numbers in prop::collection::hash_set(1u32..100, 1..10)) {
        let text = numbers
            .iter()
            .map(|n| format!("/K{n} {n} 0 R"))
            .collect::<Vec<_>>()
            .join(" ");
        let rewritten = rewrite_references(&text, &HashMap::new());
        prop_assert_eq!(&rewritten, &text);
        let found: HashSet<u32> = references_in(&rewritten).iter().map(|id| id.number()).collect();
        prop_assert_eq!(found, numbers);
    }
}
