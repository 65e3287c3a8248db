//! # native-pdf
//!
//! A hand-written PDF object model with a byte-exact serializer and a
//! tolerant parser, plus the structural operations built on top of them.
//!
//! ## Features
//!
//! - **Generation**: single-page text documents and fillable forms
//! - **Parsing**: span scanning that survives broken xref tables
//! - **Merging**: object renumbering and page-tree splicing
//! - **Editing**: form filling, file attachments and JPEG embedding that keep
//!   untouched objects byte for byte
//! - **Encryption**: RC4 with an MD5-derived 40-bit key
//!
//! ## Quick Start
//!
//! ```rust
//! use native_pdf::{build_text_document, parse_document, PdfConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let document = build_text_document("Hello, PDF!", &PdfConfig::default());
//! let bytes = document.to_bytes()?;
//!
//! let parsed = parse_document(&bytes)?;
//! assert_eq!(parsed.page_count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ### Merging and filling
//!
//! ```rust,no_run
//! use native_pdf::editors::fill_form_fields;
//! use native_pdf::{merge_pdf_files, read_pdf, write_pdf};
//!
//! # fn main() -> native_pdf::Result<()> {
//! merge_pdf_files(&["a.pdf", "b.pdf"], "merged.pdf")?;
//!
//! let form = read_pdf("form.pdf")?;
//! let filled = fill_form_fields(&form, [("Name", "Ada"), ("City", "London")])?;
//! write_pdf("filled.pdf", &filled)?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod bytes;
pub mod config;
pub mod document;
pub mod editors;
pub mod encryption;
pub mod error;
pub mod inspect;
pub mod io;
pub mod objects;
pub mod operations;
pub mod parser;
pub mod validation;
pub mod writer;

pub use builder::{build_form_document, build_image_document, build_text_document};
pub use config::{DocumentMetadata, Margins, PageOrientation, PageSize, PdfConfig};
pub use document::Document;
pub use error::{PdfError, Result};
pub use inspect::{form_field_names, page_count};
pub use io::{read_pdf, write_pdf};
pub use objects::{Dictionary, IndirectObject, ObjectBody, ObjectId};
pub use operations::{merge_documents, merge_pdf_bytes, merge_pdf_files, PdfMerger};
pub use parser::{parse_document, parse_document_lenient};
pub use validation::{is_valid_pdf, validate_pdf};
pub use writer::PdfWriter;

/// Current version of native-pdf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_empty_document() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.page_count(), 0);
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
