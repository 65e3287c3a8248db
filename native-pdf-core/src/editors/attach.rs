//! File attachment embedding
//!
//! Each file becomes an EmbeddedFile stream, a Filespec and a FileAttachment
//! annotation on the first page. The Catalog then gets a `/Names` tree
//! listing every embedded file.

use super::surgery::{append_to_array, RawDocument};
use crate::bytes::{escape_pdf_string, format_real};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, IndirectObject, ObjectId};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Icon rectangle of the first attachment; later ones are shifted right.
const ANNOT_RECT: [f64; 4] = [10.0, 10.0, 30.0, 30.0];
const ANNOT_STEP: f64 = 25.0;

/// In-memory attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a file; the attachment is named after the file name.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PdfError::ResourceNotFound(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| PdfError::InvalidArgument(format!("{} has no file name", path.display())))?;
        Ok(Self::new(name, fs::read(path)?))
    }
}

fn entries(pairs: &[(&str, String)]) -> Dictionary {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Embed files read from `paths`. Missing files are skipped with a warning.
pub fn attach_files<P: AsRef<Path>>(data: &[u8], paths: &[P]) -> Result<Vec<u8>> {
    if paths.is_empty() {
        return Err(PdfError::InvalidArgument(
            "no files given to attach".to_string(),
        ));
    }

    let mut attachments = Vec::new();
    for path in paths {
        match Attachment::from_path(path.as_ref()) {
            Ok(attachment) => attachments.push(attachment),
            Err(PdfError::ResourceNotFound(missing)) => {
                warn!("Attachment {} not found, skipping", missing.display());
            }
            Err(e) => return Err(e),
        }
    }

    if attachments.is_empty() {
        let first: PathBuf = paths[0].as_ref().to_path_buf();
        return Err(PdfError::ResourceNotFound(first));
    }
    embed_attachments(data, &attachments)
}

/// Embed in-memory attachments in the given order.
pub fn embed_attachments(data: &[u8], attachments: &[Attachment]) -> Result<Vec<u8>> {
    if attachments.is_empty() {
        return Err(PdfError::InvalidArgument(
            "no attachments given".to_string(),
        ));
    }

    let mut raw = RawDocument::parse(data)?;
    let root = raw.root().ok_or_else(|| {
        PdfError::StructuralPrecondition("document has no Catalog".to_string())
    })?;
    let page_id = raw.first_page()?;

    let mut name_entries: Vec<(String, ObjectId)> = Vec::new();
    let mut annotations = Vec::new();

    for (index, attachment) in attachments.iter().enumerate() {
        let name = escape_pdf_string(&attachment.name);

        let embedded = raw.append(|id| {
            IndirectObject::stream(
                id,
                entries(&[("Type", "/EmbeddedFile".to_string())]),
                attachment.data.clone(),
            )
        });
        let filespec = raw.append(|id| {
            IndirectObject::new(
                id,
                entries(&[
                    ("Type", "/Filespec".to_string()),
                    ("F", format!("({name})")),
                    ("EF", format!("<< /F {embedded} >>")),
                ]),
            )
        });

        let offset = ANNOT_STEP * index as f64;
        let rect = format!(
            "[{} {} {} {}]",
            format_real(ANNOT_RECT[0] + offset),
            format_real(ANNOT_RECT[1]),
            format_real(ANNOT_RECT[2] + offset),
            format_real(ANNOT_RECT[3])
        );
        let annotation = raw.append(|id| {
            IndirectObject::new(
                id,
                entries(&[
                    ("Type", "/Annot".to_string()),
                    ("Subtype", "/FileAttachment".to_string()),
                    ("Rect", rect.clone()),
                    ("FS", filespec.to_string()),
                    ("Contents", format!("({name})")),
                    ("Name", "/PushPin".to_string()),
                    ("T", "(Attachment)".to_string()),
                ]),
            )
        });

        debug!(
            "Embedded '{}' ({} bytes) as {embedded}, filespec {filespec}",
            attachment.name,
            attachment.data.len()
        );
        name_entries.push((name, filespec));
        annotations.push(annotation);
    }

    add_page_annotations(&mut raw, page_id, &annotations)?;

    let names_array: Vec<String> = name_entries
        .iter()
        .map(|(name, filespec)| format!("({name}) {filespec}"))
        .collect();
    let names = raw.append(|id| {
        IndirectObject::new(
            id,
            entries(&[("Names", format!("[{}]", names_array.join(" ")))]),
        )
    });
    let embedded_files = raw.append(|id| {
        IndirectObject::new(id, entries(&[("EmbeddedFiles", names.to_string())]))
    });

    let mut catalog = raw.require_object(root.number())?;
    if catalog.dictionary().contains_key("Names") {
        warn!("Catalog already has /Names; embedded files are not linked from it");
    } else {
        catalog.dictionary_mut().set("Names", embedded_files.to_string());
        raw.replace(&catalog);
    }

    info!("Attached {} files", attachments.len());
    raw.to_bytes()
}

/// Append annotation references to the page's `/Annots`, creating the array
/// when absent or following it when it is an indirect array object.
fn add_page_annotations(raw: &mut RawDocument, page_id: ObjectId, annotations: &[ObjectId]) -> Result<()> {
    let refs: Vec<String> = annotations.iter().map(ObjectId::to_string).collect();
    let refs = refs.join(" ");
    let mut page = raw.require_object(page_id.number())?;

    let current = page.dictionary().get("Annots").map(|v| v.trim().to_string());
    match current {
        Some(array) if array.starts_with('[') => {
            page.dictionary_mut().set("Annots", append_to_array(&array, &refs));
            raw.replace(&page);
        }
        Some(value) => {
            let array_object = ObjectId::parse_reference(&value)
                .and_then(|id| raw.object(id.number()))
                .filter(|object| object.inline_text().is_some_and(|t| t.trim_start().starts_with('[')));
            match array_object {
                Some(object) => {
                    let text = object.inline_text().unwrap_or("[]").to_string();
                    let updated = IndirectObject::inline(object.id(), append_to_array(&text, &refs));
                    raw.replace(&updated);
                }
                None => {
                    page.dictionary_mut().set("Annots", format!("[{refs}]"));
                    raw.replace(&page);
                }
            }
        }
        None => {
            page.dictionary_mut().set("Annots", format!("[{refs}]"));
            raw.replace(&page);
        }
    }
    Ok(())
}
