//! Byte and offset helpers
//!
//! Offsets in a PDF file are byte offsets. Text handled by this crate is mapped
//! one character to one byte (ISO-8859-1), so a character position in decoded
//! text and a byte position in the encoded buffer always agree.

/// Marker that terminates every document this crate produces.
pub const EOF_MARKER: &[u8] = b"%%EOF";

/// Marker that starts every PDF header banner.
pub const HEADER_MARKER: &[u8] = b"%PDF-";

/// Encode text as single-byte ISO-8859-1. Characters outside the range become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Decode single-byte ISO-8859-1 data. Never fails: every byte maps to a char.
pub fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| char::from(b)).collect()
}

/// Number of bytes `text` occupies once written.
pub fn byte_len(text: &str) -> usize {
    text.chars().count()
}

/// Uppercase hexadecimal form used for `/O` and `/U` strings.
pub fn to_hex_upper(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// True when `data` ends with exactly `marker`.
pub fn ends_with_marker(data: &[u8], marker: &[u8]) -> bool {
    data.ends_with(marker)
}

/// First position of `needle` at or after `from`.
pub fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

/// Last position of `needle` that ends at or before `before`.
pub fn rfind_bytes(haystack: &[u8], needle: &[u8], before: usize) -> Option<usize> {
    let end = before.min(haystack.len());
    if needle.is_empty() || needle.len() > end {
        return None;
    }
    haystack[..end]
        .windows(needle.len())
        .rposition(|window| window == needle)
}

/// Escape text for a PDF literal string: backslash, parentheses and line breaks.
pub fn escape_pdf_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverse [`escape_pdf_string`] for the escapes it produces.
pub fn unescape_pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Format a real number with at most six decimals and no trailing zeros.
pub fn format_real(value: f64) -> String {
    let formatted = format!("{value:.6}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Length of the line terminator starting at `pos` (`\r\n`, `\n` or `\r`), or 0.
pub fn line_terminator_len(data: &[u8], pos: usize) -> usize {
    match (data.get(pos), data.get(pos + 1)) {
        (Some(b'\r'), Some(b'\n')) => 2,
        (Some(b'\n'), _) | (Some(b'\r'), _) => 1,
        _ => 0,
    }
}

/// Drop one trailing line terminator, if any.
pub fn trim_one_line_terminator(data: &[u8]) -> &[u8] {
    if data.ends_with(b"\r\n") {
        &data[..data.len() - 2]
    } else if data.ends_with(b"\n") || data.ends_with(b"\r") {
        &data[..data.len() - 1]
    } else {
        data
    }
}
