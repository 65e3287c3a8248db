use crate::bytes::encode_latin1;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, IndirectObject, ObjectId};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Binary marker comment written after the header banner.
const BINARY_COMMENT: &[u8] = &[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'];

/// Values written into the trailer dictionary.
#[derive(Debug, Clone, Default)]
pub struct TrailerInfo {
    pub root: Option<ObjectId>,
    pub encrypt: Option<ObjectId>,
    pub info: Option<Dictionary>,
}

/// One pre-serialized `N G obj ... endobj` span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    pub id: ObjectId,
    pub bytes: Vec<u8>,
}

pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<u32, (u64, u16)>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        self.write_header(document.header(), document.header_comments())?;

        for object in document.iter() {
            self.write_object(object)?;
        }

        let xref_position = self.write_xref()?;
        let trailer = TrailerInfo {
            root: document.root(),
            encrypt: document.encrypt(),
            info: document.info().cloned(),
        };
        self.write_trailer(&trailer, xref_position)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Banner line, binary marker, then one comment line each.
    pub fn write_header(&mut self, banner: &str, comments: &[String]) -> Result<()> {
        self.write_bytes(&encode_latin1(banner.trim_end()))?;
        self.write_bytes(b"\n")?;
        self.write_bytes(BINARY_COMMENT)?;
        for comment in comments {
            self.write_bytes(&encode_latin1(comment))?;
            self.write_bytes(b"\n")?;
        }
        Ok(())
    }

    /// Write header bytes exactly as given, adding a newline when missing.
    pub fn write_raw_header(&mut self, header: &[u8]) -> Result<()> {
        self.write_bytes(header)?;
        if !header.ends_with(b"\n") && !header.ends_with(b"\r") {
            self.write_bytes(b"\n")?;
        }
        Ok(())
    }

    pub fn write_object(&mut self, object: &IndirectObject) -> Result<()> {
        let bytes = object.to_bytes();
        self.write_raw_object(object.id(), &bytes)
    }

    pub fn write_raw_object(&mut self, id: ObjectId, bytes: &[u8]) -> Result<()> {
        if self.xref_positions.contains_key(&id.number()) {
            return Err(PdfError::ObjectCollision(id.number()));
        }
        self.xref_positions
            .insert(id.number(), (self.current_position, id.generation()));
        self.write_bytes(bytes)?;
        if !bytes.ends_with(b"\n") {
            self.write_bytes(b"\n")?;
        }
        Ok(())
    }

    /// Write the cross-reference section and return the offset of `xref`.
    pub fn write_xref(&mut self) -> Result<u64> {
        let xref_position = self.current_position;
        let max_obj_num = self.xref_positions.keys().next_back().copied().unwrap_or(0);

        self.write_bytes(b"xref\n")?;
        self.write_bytes(format!("0 {}\n", max_obj_num + 1).as_bytes())?;
        self.write_bytes(b"0000000000 65535 f \n")?;

        for obj_num in 1..=max_obj_num {
            let entry = match self.xref_positions.get(&obj_num) {
                Some((position, generation)) => format!("{position:010} {generation:05} n \n"),
                None => "0000000000 00000 f \n".to_string(),
            };
            self.write_bytes(entry.as_bytes())?;
        }

        Ok(xref_position)
    }

    /// Trailer, `startxref` and the end-of-file marker with nothing after it.
    pub fn write_trailer(&mut self, trailer: &TrailerInfo, xref_position: u64) -> Result<()> {
        let max_obj_num = self.xref_positions.keys().next_back().copied().unwrap_or(0);

        let mut dict = Dictionary::new();
        dict.set("Size", (max_obj_num + 1).to_string());
        if let Some(root) = trailer.root {
            dict.set("Root", root.to_string());
        }
        if let Some(encrypt) = trailer.encrypt {
            dict.set("Encrypt", encrypt.to_string());
        }
        if let Some(info) = trailer.info.as_ref().filter(|info| !info.is_empty()) {
            dict.set("Info", info.to_pdf_string());
        }

        self.write_bytes(b"trailer\n")?;
        self.write_bytes(&encode_latin1(&dict.to_pdf_string()))?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF")?;
        Ok(())
    }

    /// Offsets recorded so far, keyed by object number.
    pub fn positions(&self) -> &BTreeMap<u32, (u64, u16)> {
        &self.xref_positions
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

impl PdfWriter<BufWriter<File>> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new_with_writer(BufWriter::new(file)))
    }
}

/// Reassemble a file from pre-serialized object spans.
///
/// Objects are written in ascending number order behind `header`; offsets,
/// the xref table and the trailer are recomputed from scratch.
pub fn assemble_raw(header: &[u8], objects: &[RawObject], trailer: &TrailerInfo) -> Result<Vec<u8>> {
    let mut ordered: Vec<&RawObject> = objects.iter().collect();
    ordered.sort_by_key(|object| object.id.number());

    let mut writer = PdfWriter::new_with_writer(Vec::new());
    writer.write_raw_header(header)?;
    for object in ordered {
        writer.write_raw_object(object.id, &object.bytes)?;
    }
    let xref_position = writer.write_xref()?;
    writer.write_trailer(trailer, xref_position)?;
    Ok(writer.into_inner())
}
