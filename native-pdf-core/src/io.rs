//! Whole-file read and write helpers

use crate::error::{PdfError, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read a whole file. A missing path is `ResourceNotFound`.
pub fn read_pdf(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PdfError::ResourceNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}

pub fn write_pdf(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, data)?;
    debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
