use crate::bytes::{decode_latin1, find_bytes, HEADER_MARKER};
use crate::document::DEFAULT_HEADER;

/// Bytes searched for a banner that does not start at offset 0.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Header banner found at the start of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    pub banner: String,
    /// False when the banner was missing and the default was substituted.
    pub found: bool,
}

impl PdfHeader {
    /// Read `%PDF-x.y` up to its line terminator, falling back to the default.
    pub fn parse(data: &[u8]) -> Self {
        let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
        let Some(start) = find_bytes(window, HEADER_MARKER, 0) else {
            return Self {
                banner: DEFAULT_HEADER.to_string(),
                found: false,
            };
        };

        let end = data[start..]
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .map_or(data.len(), |pos| start + pos);
        let banner = decode_latin1(&data[start..end]).trim_end().to_string();

        Self {
            banner,
            found: true,
        }
    }

    pub fn version(&self) -> &str {
        self.banner
            .strip_prefix("%PDF-")
            .map(str::trim)
            .unwrap_or_default()
    }
}
