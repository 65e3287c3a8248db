use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed PDF input: {0}")]
    MalformedInput(String),

    #[error("Structural precondition failed: {0}")]
    StructuralPrecondition(String),

    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Object number {0} is already in use")]
    ObjectCollision(u32),
}

pub type Result<T> = std::result::Result<T, PdfError>;
