//! Document-level operations

pub mod merge;

pub use merge::{merge_documents, merge_pdf_bytes, merge_pdf_files, PdfMerger};
