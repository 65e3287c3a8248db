//! Best-effort sanity checks on serialized output
//!
//! These checks only look for the markers every file must carry. They do not
//! prove a document is well formed.

use crate::bytes::{find_bytes, rfind_bytes, EOF_MARKER, HEADER_MARKER};
use crate::error::{PdfError, Result};

/// Keywords every produced file must contain.
const REQUIRED_KEYWORDS: [&str; 3] = ["trailer", "startxref", "obj"];

/// Check header, end-of-file marker and required keywords.
pub fn validate_pdf(data: &[u8]) -> Result<()> {
    if !data.starts_with(HEADER_MARKER) {
        return Err(PdfError::MalformedInput(
            "missing %PDF- header".to_string(),
        ));
    }

    let eof = rfind_bytes(data, EOF_MARKER, data.len())
        .ok_or_else(|| PdfError::MalformedInput("missing %%EOF marker".to_string()))?;
    let tail = &data[eof + EOF_MARKER.len()..];
    if !tail.iter().all(u8::is_ascii_whitespace) {
        return Err(PdfError::MalformedInput(format!(
            "{} bytes of data after %%EOF",
            tail.len()
        )));
    }

    for keyword in REQUIRED_KEYWORDS {
        if find_bytes(data, keyword.as_bytes(), 0).is_none() {
            return Err(PdfError::MalformedInput(format!(
                "missing '{keyword}' keyword"
            )));
        }
    }

    Ok(())
}

pub fn is_valid_pdf(data: &[u8]) -> bool {
    validate_pdf(data).is_ok()
}
