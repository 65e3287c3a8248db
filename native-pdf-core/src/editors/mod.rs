//! Structural editors for existing files
//!
//! Every editor takes the bytes of a complete file and returns the bytes of a
//! new one. Inputs carrying `/Encrypt` are rejected.

pub mod attach;
pub mod form_fill;
pub mod image;
pub mod jpeg;
pub mod surgery;

pub use attach::{attach_files, embed_attachments, Attachment};
pub use form_fill::fill_form_fields;
pub use image::{compute_placement, embed_image, embed_image_file, ImageOptions, Placement};
pub use jpeg::{parse_jpeg_header, ColorSpace, JpegInfo};
pub use surgery::RawDocument;
