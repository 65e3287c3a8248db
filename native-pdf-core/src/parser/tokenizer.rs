//! Object span scanning and dictionary extraction
//!
//! Works directly on the file bytes. Spans, dictionaries and stream payloads
//! are located by pattern search plus balanced bracket matching; no full
//! lexer is involved.

use crate::bytes::{decode_latin1, find_bytes, line_terminator_len, rfind_bytes, trim_one_line_terminator};
use crate::objects::{Dictionary, IndirectObject, ObjectBody, ObjectId};
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref OBJECT_START_RE: Regex = Regex::new(r"(?-u)\b(\d+)\s+(\d+)\s+obj\b").unwrap();
}

/// Location of one `N G obj ... endobj` span in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectSpan {
    pub id: ObjectId,
    /// Offset of the object number.
    pub start: usize,
    /// Offset just past the object header (`obj`).
    pub body_start: usize,
    /// Offset just past `endobj`.
    pub end: usize,
}

impl ObjectSpan {
    pub fn bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start..self.end]
    }

    pub fn body<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.body_start..self.end]
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' | b'\x00')
}

fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'/' | b'[' | b']' | b'<' | b'>' | b'(' | b')' | b'{' | b'}' | b'%')
}

fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && is_whitespace(data[pos]) {
        pos += 1;
    }
    pos
}

/// Offset just past the literal string opening at `start`, honoring escapes
/// and nested parentheses. Unterminated strings run to the end of `data`.
fn skip_literal_string(data: &[u8], start: usize) -> usize {
    let mut depth = 0usize;
    let mut pos = start;
    while pos < data.len() {
        match data[pos] {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return pos + 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    data.len()
}

/// Offset just past the `>>` matching the `<<` at `start`.
pub fn find_dictionary_end(data: &[u8], start: usize) -> Option<usize> {
    if !data[start..].starts_with(b"<<") {
        return None;
    }
    let mut depth = 0usize;
    let mut pos = start;
    while pos < data.len() {
        if data[pos..].starts_with(b"<<") {
            depth += 1;
            pos += 2;
        } else if data[pos..].starts_with(b">>") {
            depth = depth.saturating_sub(1);
            pos += 2;
            if depth == 0 {
                return Some(pos);
            }
        } else if data[pos] == b'(' {
            pos = skip_literal_string(data, pos);
        } else if data[pos] == b'<' {
            pos = find_bytes(data, b">", pos).map_or(data.len(), |end| end + 1);
        } else {
            pos += 1;
        }
    }
    None
}

/// Split `<< /Key value ... >>` into entries.
///
/// A value runs until the next `/key` at nesting depth zero, counting
/// `<< >>`, `[ ]` and `( )`. A value that is itself a name ends with that
/// name. Keys without a value are stored with empty text.
pub fn parse_dictionary(text: &[u8]) -> Dictionary {
    let mut inner = text;
    let trimmed_start = skip_whitespace(inner, 0);
    inner = &inner[trimmed_start..];
    if let Some(stripped) = inner.strip_prefix(b"<<") {
        inner = stripped;
        let mut end = inner.len();
        while end > 0 && is_whitespace(inner[end - 1]) {
            end -= 1;
        }
        if inner[..end].ends_with(b">>") {
            end -= 2;
        }
        inner = &inner[..end];
    }

    let mut dict = Dictionary::new();
    let mut pos = 0;
    while pos < inner.len() {
        pos = skip_whitespace(inner, pos);
        if pos >= inner.len() {
            break;
        }
        if inner[pos] != b'/' {
            pos += 1;
            continue;
        }

        let key_start = pos + 1;
        pos = key_start;
        while pos < inner.len() && !is_delimiter(inner[pos]) {
            pos += 1;
        }
        let key = decode_latin1(&inner[key_start..pos]);

        pos = skip_whitespace(inner, pos);
        let value_start = pos;
        if pos < inner.len() && inner[pos] == b'/' {
            pos += 1;
            while pos < inner.len() && !is_delimiter(inner[pos]) {
                pos += 1;
            }
        } else {
            pos = scan_value_end(inner, pos);
        }

        let value = decode_latin1(&inner[value_start..pos]).trim().to_string();
        if !key.is_empty() {
            dict.set(key, value);
        }
    }
    dict
}

fn scan_value_end(data: &[u8], mut pos: usize) -> usize {
    let mut depth = 0usize;
    while pos < data.len() {
        match data[pos] {
            b'/' if depth == 0 => return pos,
            b'(' => {
                pos = skip_literal_string(data, pos);
                continue;
            }
            b'<' if data[pos..].starts_with(b"<<") => {
                depth += 1;
                pos += 2;
                continue;
            }
            b'>' if data[pos..].starts_with(b">>") => {
                depth = depth.saturating_sub(1);
                pos += 2;
                continue;
            }
            b'<' => {
                pos = find_bytes(data, b">", pos).map_or(data.len(), |end| end + 1);
                continue;
            }
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        pos += 1;
    }
    data.len()
}

/// Stream payload starting right after the `stream` keyword at `keyword`.
///
/// Returns the payload and the offset of `endstream`. A direct `/Length` that
/// lands on `endstream` is trusted; otherwise the payload runs up to
/// `endstream` minus one line terminator.
fn extract_stream(data: &[u8], keyword: usize, dict: &Dictionary) -> Option<(Vec<u8>, usize)> {
    let after_keyword = keyword + b"stream".len();
    let payload_start = after_keyword + line_terminator_len(data, after_keyword);

    if let Some(length) = dict.get_integer("Length").and_then(|l| usize::try_from(l).ok()) {
        let payload_end = payload_start.checked_add(length)?;
        if payload_end <= data.len() {
            let marker = skip_whitespace(data, payload_end);
            if data[marker..].starts_with(b"endstream") {
                return Some((data[payload_start..payload_end].to_vec(), marker));
            }
        }
    }

    let endstream = find_bytes(data, b"endstream", payload_start)?;
    let payload = trim_one_line_terminator(&data[payload_start..endstream]);
    Some((payload.to_vec(), endstream))
}

/// Every object span in file order. Spans never overlap; text inside a
/// stream payload is never mistaken for a new object.
pub fn scan_object_spans(data: &[u8]) -> Vec<ObjectSpan> {
    let mut spans = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let Some(caps) = OBJECT_START_RE.captures_at(data, pos) else {
            break;
        };
        let (Some(whole), Some(number), Some(generation)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let number = std::str::from_utf8(number.as_bytes()).ok().and_then(|s| s.parse::<u32>().ok());
        let generation = std::str::from_utf8(generation.as_bytes()).ok().and_then(|s| s.parse::<u16>().ok());
        let (Some(number), Some(generation)) = (number, generation) else {
            pos = whole.end();
            continue;
        };

        let body_start = whole.end();
        let search_from = body_end_hint(data, body_start);
        let end = match find_bytes(data, b"endobj", search_from) {
            Some(endobj) => endobj + b"endobj".len(),
            None => next_object_start(data, body_start).unwrap_or(data.len()),
        };

        spans.push(ObjectSpan {
            id: ObjectId::new(number, generation),
            start: whole.start(),
            body_start,
            end,
        });
        pos = end;
    }

    spans
}

/// Offset from which `endobj` may be searched: past the dictionary and any
/// stream payload of the object whose body starts at `body_start`.
fn body_end_hint(data: &[u8], body_start: usize) -> usize {
    let dict_start = skip_whitespace(data, body_start);
    let Some(dict_end) = find_dictionary_end(data, dict_start) else {
        return body_start;
    };
    let after_dict = skip_whitespace(data, dict_end);
    if data[after_dict..].starts_with(b"stream") {
        let dict = parse_dictionary(&data[dict_start..dict_end]);
        if let Some((_, endstream)) = extract_stream(data, after_dict, &dict) {
            return endstream + b"endstream".len();
        }
    }
    dict_end
}

fn next_object_start(data: &[u8], from: usize) -> Option<usize> {
    OBJECT_START_RE.find_at(data, from).map(|m| m.start())
}

/// Build the in-memory object for one span.
pub fn parse_object(data: &[u8], span: &ObjectSpan) -> IndirectObject {
    let body_end = rfind_bytes(data, b"endobj", span.end)
        .filter(|&pos| pos >= span.body_start)
        .unwrap_or(span.end);

    let dict_start = skip_whitespace(data, span.body_start);
    let (dict, body) = match find_dictionary_end(data, dict_start).filter(|&end| end <= body_end) {
        Some(dict_end) => {
            let dict = parse_dictionary(&data[dict_start..dict_end]);
            let after_dict = skip_whitespace(data, dict_end);
            let body = if data[after_dict..].starts_with(b"stream") {
                extract_stream(data, after_dict, &dict)
                    .map_or(ObjectBody::Empty, |(payload, _)| ObjectBody::Stream(payload))
            } else {
                inline_body(&data[dict_end..body_end])
            };
            (dict, body)
        }
        None => (Dictionary::new(), inline_body(&data[span.body_start..body_end])),
    };

    let mut object = IndirectObject::from_parts(span.id, dict, body);
    object.offset = Some(span.start as u64);
    object
}

fn inline_body(data: &[u8]) -> ObjectBody {
    let text = decode_latin1(data).trim().to_string();
    if text.is_empty() {
        ObjectBody::Empty
    } else {
        ObjectBody::Inline(text)
    }
}

/// Dictionary following the last `trailer` keyword, if any.
pub fn parse_trailer(data: &[u8]) -> Option<Dictionary> {
    let keyword = rfind_bytes(data, b"trailer", data.len())?;
    let dict_start = find_bytes(data, b"<<", keyword)?;
    let dict_end = find_dictionary_end(data, dict_start)?;
    Some(parse_dictionary(&data[dict_start..dict_end]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_dictionary_basic() {
        let dict = parse_dictionary(b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
        assert_eq!(dict.get("Type"), Some("/Page"));
        assert_eq!(dict.get("Parent"), Some("2 0 R"));
        assert_eq!(dict.get("MediaBox"), Some("[0 0 612 792]"));
    }

    #[test]
    fn test_parse_dictionary_nested_values_stay_intact() {
        let dict = parse_dictionary(
            b"<< /Resources << /Font << /F1 5 0 R >> >> /DA (/F1 12 Tf 0 g) /Contents 4 0 R >>",
        );
        assert_eq!(dict.get("Resources"), Some("<< /Font << /F1 5 0 R >> >>"));
        assert_eq!(dict.get("DA"), Some("(/F1 12 Tf 0 g)"));
        assert_eq!(dict.get("Contents"), Some("4 0 R"));
    }

    #[test]
    fn test_parse_dictionary_compact_names() {
        let dict = parse_dictionary(b"<</Type/Catalog/Pages 2 0 R>>");
        assert_eq!(dict.get("Type"), Some("/Catalog"));
        assert_eq!(dict.get("Pages"), Some("2 0 R"));
    }

    #[test]
    fn test_parse_dictionary_hex_and_escaped_strings() {
        let dict = parse_dictionary(b"<< /O <0A1B> /T (a\\)b/c) /P -4 >>");
        assert_eq!(dict.get("O"), Some("<0A1B>"));
        assert_eq!(dict.get("T"), Some("(a\\)b/c)"));
        assert_eq!(dict.get_integer("P"), Some(-4));
    }

    #[test]
    fn test_find_dictionary_end_skips_strings() {
        let data = b"<< /T (>>) /K << /A 1 >> >> tail";
        let end = find_dictionary_end(data, 0).unwrap();
        assert_eq!(&data[end..], b" tail");
    }

    #[test]
    fn test_scan_spans_skip_stream_content() {
        let data = b"%PDF-1.7\n1 0 obj\n<< /Length 14 >>\nstream\n2 0 obj endobj\nendstream\nendobj\n3 0 obj\n<< /Type /X >>\nendobj\n";
        let spans = scan_object_spans(data);
        let numbers: Vec<u32> = spans.iter().map(|s| s.id.number()).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(spans[0].bytes(data).ends_with(b"endobj"));
        assert_eq!(spans[1].start, find_bytes(data, b"3 0 obj", 0).unwrap());
    }

    #[test]
    fn test_parse_object_stream_uses_length() {
        let data = b"4 0 obj\n<< /Length 6 >>\nstream\nab\r\ncd\nendstream\nendobj\n";
        let spans = scan_object_spans(data);
        let object = parse_object(data, &spans[0]);
        assert_eq!(object.stream_data(), Some(&b"ab\r\ncd"[..]));
    }

    #[test]
    fn test_parse_object_stream_without_reliable_length() {
        let data = b"4 0 obj\n<< /Length 9 0 R >>\nstream\nBT ET\nendstream\nendobj\n";
        let spans = scan_object_spans(data);
        let object = parse_object(data, &spans[0]);
        assert_eq!(object.stream_data(), Some(&b"BT ET"[..]));
    }

    #[test]
    fn test_parse_inline_object() {
        let data = b"8 0 obj\n[6 0 R 7 0 R]\nendobj\n";
        let spans = scan_object_spans(data);
        let object = parse_object(data, &spans[0]);
        assert!(object.dictionary().is_empty());
        assert_eq!(object.inline_text(), Some("[6 0 R 7 0 R]"));
        assert_eq!(object.offset, Some(0));
    }

    #[test]
    fn test_parse_trailer() {
        let data = b"xref\ntrailer\n<< /Size 6 /Root 1 0 R /Info << /Title (x) >> >>\nstartxref\n0\n%%EOF";
        let trailer = parse_trailer(data).unwrap();
        assert_eq!(trailer.get_reference("Root"), Some(ObjectId::new(1, 0)));
        assert_eq!(trailer.get("Info"), Some("<< /Title (x) >>"));
    }
}
