use super::dictionary::Dictionary;
use super::reference::{references_in, rewrite_references, ObjectId};
use crate::bytes::{decode_latin1, encode_latin1};
use std::collections::HashMap;

/// Content that follows an object's dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    /// Dictionary-only object.
    Empty,
    /// Non-dictionary inline value, e.g. `[6 0 R 7 0 R]`.
    Inline(String),
    /// Raw `stream ... endstream` payload.
    Stream(Vec<u8>),
}

/// Semantic role derived from `/Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    Catalog,
    Pages,
    Page,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    id: ObjectId,
    dictionary: Dictionary,
    body: ObjectBody,
    /// Byte offset in the buffer this object was last read from or written to.
    pub offset: Option<u64>,
}

impl IndirectObject {
    pub fn new(id: ObjectId, dictionary: Dictionary) -> Self {
        Self {
            id,
            dictionary,
            body: ObjectBody::Empty,
            offset: None,
        }
    }

    pub fn inline(id: ObjectId, text: impl Into<String>) -> Self {
        Self {
            id,
            dictionary: Dictionary::new(),
            body: ObjectBody::Inline(text.into()),
            offset: None,
        }
    }

    /// Stream object; `/Length` is set from `data`.
    pub fn stream(id: ObjectId, dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut object = Self::new(id, dictionary);
        object.set_stream_data(data);
        object
    }

    /// Reassemble an object from parsed parts without touching `/Length`.
    pub fn from_parts(id: ObjectId, dictionary: Dictionary, body: ObjectBody) -> Self {
        Self {
            id,
            dictionary,
            body,
            offset: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn number(&self) -> u32 {
        self.id.number()
    }

    pub fn generation(&self) -> u16 {
        self.id.generation()
    }

    pub(crate) fn set_number(&mut self, number: u32) {
        self.id = ObjectId::new(number, self.id.generation());
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn body(&self) -> &ObjectBody {
        &self.body
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.body, ObjectBody::Stream(_))
    }

    pub fn stream_data(&self) -> Option<&[u8]> {
        match &self.body {
            ObjectBody::Stream(data) => Some(data),
            _ => None,
        }
    }

    /// Replace the payload and keep `/Length` equal to its byte length.
    pub fn set_stream_data(&mut self, data: Vec<u8>) {
        self.dictionary.set("Length", data.len().to_string());
        self.body = ObjectBody::Stream(data);
    }

    pub fn inline_text(&self) -> Option<&str> {
        match &self.body {
            ObjectBody::Inline(text) => Some(text),
            _ => None,
        }
    }

    pub fn role(&self) -> ObjectRole {
        match self.dictionary.get_name("Type") {
            Some("Catalog") => ObjectRole::Catalog,
            Some("Pages") => ObjectRole::Pages,
            Some("Page") => ObjectRole::Page,
            _ => ObjectRole::Other,
        }
    }

    /// Every reference in the dictionary and inline body.
    ///
    /// Stream payloads are opaque and never scanned.
    pub fn references(&self) -> Vec<ObjectId> {
        let mut refs: Vec<ObjectId> = self
            .dictionary
            .iter()
            .flat_map(|(_, value)| references_in(value))
            .collect();
        if let ObjectBody::Inline(text) = &self.body {
            refs.extend(references_in(text));
        }
        refs
    }

    /// Renumber references in dictionary values and inline body in one pass.
    pub fn rewrite_references(&mut self, map: &HashMap<u32, u32>) {
        for value in self.dictionary.values_mut() {
            *value = rewrite_references(value, map);
        }
        if let ObjectBody::Inline(text) = &mut self.body {
            *text = rewrite_references(text, map);
        }
    }

    /// Serialized form: `N G obj\n<< ... >>\n[stream\n...\nendstream\n]endobj\n`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} obj\n", self.number(), self.generation()).into_bytes();
        let write_dictionary =
            !self.dictionary.is_empty() || !matches!(self.body, ObjectBody::Inline(_));
        if write_dictionary {
            out.extend(encode_latin1(&self.dictionary.to_pdf_string()));
            out.push(b'\n');
        }
        match &self.body {
            ObjectBody::Empty => {}
            ObjectBody::Inline(text) => {
                out.extend(encode_latin1(text.trim()));
                out.push(b'\n');
            }
            ObjectBody::Stream(data) => {
                out.extend_from_slice(b"stream\n");
                out.extend_from_slice(data);
                out.extend_from_slice(b"\nendstream\n");
            }
        }
        out.extend_from_slice(b"endobj\n");
        out
    }

    /// Latin-1 view of the serialized object, used by text searches.
    pub fn to_text(&self) -> String {
        decode_latin1(&self.to_bytes())
    }
}
