//! Password-based stream encryption (`/Filter /Standard /V 1 /R 2`)
//!
//! Key derivation follows the revision 2 handler with two simplifications:
//! `/U` is a single RC4 pass over the padding string, and every stream is
//! encrypted with the file key directly rather than a per-object key. Files
//! written this way round-trip through [`decrypt_document`] but are not
//! expected to open in general-purpose readers.

use super::rc4::{rc4_encrypt, Rc4Key};
use crate::bytes::to_hex_upper;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, ObjectBody};
use crate::parser::parse_document;
use crate::validation::validate_pdf;
use tracing::{debug, info};

/// Password padding string
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Permission mask written to `/P`.
pub const PERMISSIONS: i32 = -4;

/// File key length in bytes (40 bits).
pub const KEY_LENGTH: usize = 5;

/// Truncate or pad a password to exactly 32 bytes.
pub fn pad_password(password: &str) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let bytes = password.as_bytes();
    let len = bytes.len().min(32);

    padded[..len].copy_from_slice(&bytes[..len]);
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    padded
}

/// Derived `/O`, `/U` and file key for one password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHandler {
    owner_hash: Vec<u8>,
    user_hash: Vec<u8>,
    file_key: Vec<u8>,
}

impl SecurityHandler {
    pub fn new(user_password: &str, owner_password: &str) -> Self {
        let user_pad = pad_password(user_password);
        let owner_pad = pad_password(owner_password);

        let owner_hash = rc4_encrypt(&Rc4Key::from_slice(&owner_pad), &user_pad);
        Self::from_owner_hash(user_password, owner_hash)
    }

    /// Rebuild the handler from a stored `/O` value and a candidate user password.
    pub fn from_owner_hash(user_password: &str, owner_hash: Vec<u8>) -> Self {
        let file_key = compute_file_key(&pad_password(user_password), &owner_hash);
        let user_hash = rc4_encrypt(&Rc4Key::from_slice(&file_key), &PADDING);
        Self {
            owner_hash,
            user_hash,
            file_key,
        }
    }

    pub fn owner_hash(&self) -> &[u8] {
        &self.owner_hash
    }

    pub fn user_hash(&self) -> &[u8] {
        &self.user_hash
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }

    /// Encrypt or decrypt a stream payload.
    pub fn process_stream(&self, data: &[u8]) -> Vec<u8> {
        rc4_encrypt(&Rc4Key::from_slice(&self.file_key), data)
    }

    /// The `/Encrypt` dictionary describing this handler.
    pub fn encryption_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Filter", "/Standard");
        dict.set("V", "1");
        dict.set("R", "2");
        dict.set("O", format!("<{}>", to_hex_upper(&self.owner_hash)));
        dict.set("U", format!("<{}>", to_hex_upper(&self.user_hash)));
        dict.set("P", PERMISSIONS.to_string());
        dict.set("Length", (KEY_LENGTH * 8).to_string());
        dict
    }
}

fn compute_file_key(user_pad: &[u8; 32], owner_hash: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(32 + owner_hash.len() + 4);
    input.extend_from_slice(user_pad);
    input.extend_from_slice(owner_hash);
    input.extend_from_slice(&PERMISSIONS.to_le_bytes());
    md5::compute(&input)[..KEY_LENGTH].to_vec()
}

/// Encrypt every stream of `document` and register the Encrypt dictionary.
pub fn encrypt_document(mut document: Document, user_password: &str, owner_password: &str) -> Result<Document> {
    if document.encrypt().is_some() {
        return Err(PdfError::StructuralPrecondition(
            "document is already encrypted".to_string(),
        ));
    }

    let handler = SecurityHandler::new(user_password, owner_password);
    let mut streams = 0usize;
    for object in document.iter_mut() {
        if let Some(data) = object.stream_data() {
            let encrypted = handler.process_stream(data);
            object.set_stream_data(encrypted);
            streams += 1;
        }
    }

    let encrypt_id = document.push(handler.encryption_dictionary(), ObjectBody::Empty);
    document.set_encrypt(Some(encrypt_id));

    debug!("Encrypted {streams} streams, Encrypt dictionary is {encrypt_id}");
    info!("Document encrypted");
    Ok(document)
}

/// Parse, encrypt and re-serialize.
pub fn encrypt_pdf(data: &[u8], user_password: &str, owner_password: &str) -> Result<Vec<u8>> {
    let document = parse_document(data)?;
    let bytes = encrypt_document(document, user_password, owner_password)?.to_bytes()?;
    validate_pdf(&bytes)?;
    Ok(bytes)
}

/// Reverse [`encrypt_document`] given the user password.
pub fn decrypt_document(mut document: Document, user_password: &str) -> Result<Document> {
    let encrypt_id = document.encrypt().ok_or_else(|| {
        PdfError::StructuralPrecondition("document is not encrypted".to_string())
    })?;
    let dict = document
        .get(encrypt_id.number())
        .map(|object| object.dictionary().clone())
        .ok_or_else(|| {
            PdfError::MalformedInput(format!("Encrypt dictionary {encrypt_id} is missing"))
        })?;

    if dict.get_name("Filter") != Some("Standard") {
        return Err(PdfError::StructuralPrecondition(
            "unsupported security handler".to_string(),
        ));
    }
    let owner_hash = read_hex_string(&dict, "O")?;
    let user_hash = read_hex_string(&dict, "U")?;

    let handler = SecurityHandler::from_owner_hash(user_password, owner_hash);
    if handler.user_hash() != user_hash.as_slice() {
        return Err(PdfError::InvalidArgument("incorrect user password".to_string()));
    }

    document.remove(encrypt_id.number());
    document.set_encrypt(None);
    for object in document.iter_mut() {
        if let Some(data) = object.stream_data() {
            let decrypted = handler.process_stream(data);
            object.set_stream_data(decrypted);
        }
    }

    info!("Document decrypted");
    Ok(document)
}

/// Parse, decrypt and re-serialize.
pub fn decrypt_pdf(data: &[u8], user_password: &str) -> Result<Vec<u8>> {
    let document = parse_document(data)?;
    let bytes = decrypt_document(document, user_password)?.to_bytes()?;
    validate_pdf(&bytes)?;
    Ok(bytes)
}

fn read_hex_string(dict: &Dictionary, key: &str) -> Result<Vec<u8>> {
    let value = dict
        .get(key)
        .map(str::trim)
        .ok_or_else(|| PdfError::MalformedInput(format!("Encrypt dictionary has no /{key}")))?;
    let hex_digits = value
        .strip_prefix('<')
        .and_then(|v| v.strip_suffix('>'))
        .ok_or_else(|| PdfError::MalformedInput(format!("/{key} is not a hex string")))?;
    let compact: String = hex_digits.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    hex::decode(compact).map_err(|e| PdfError::MalformedInput(format!("/{key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_text_document;
    use crate::config::PdfConfig;
    use crate::validation::is_valid_pdf;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pad_password() {
        let padded = pad_password("user");
        assert_eq!(&padded[..4], b"user");
        assert_eq!(&padded[4..], &PADDING[..28]);

        assert_eq!(pad_password(""), PADDING);

        let long = "a".repeat(40);
        assert_eq!(&pad_password(&long)[..], &long.as_bytes()[..32]);
    }

    #[test]
    fn test_handler_values() {
        let handler = SecurityHandler::new("user", "owner");
        assert_eq!(handler.owner_hash().len(), 32);
        assert_eq!(handler.user_hash().len(), 32);
        assert_eq!(handler.file_key().len(), KEY_LENGTH);

        let owner = rc4_encrypt(&Rc4Key::from_slice(&pad_password("owner")), &pad_password("user"));
        assert_eq!(handler.owner_hash(), owner.as_slice());

        let mut input = pad_password("user").to_vec();
        input.extend_from_slice(&owner);
        input.extend_from_slice(&[0xFC, 0xFF, 0xFF, 0xFF]);
        assert_eq!(handler.file_key(), &md5::compute(&input)[..5]);

        let user = rc4_encrypt(&Rc4Key::from_slice(handler.file_key()), &PADDING);
        assert_eq!(handler.user_hash(), user.as_slice());
    }

    #[test]
    fn test_handler_is_deterministic() {
        assert_eq!(SecurityHandler::new("a", "b"), SecurityHandler::new("a", "b"));
        assert_ne!(
            SecurityHandler::new("a", "b").file_key(),
            SecurityHandler::new("a", "c").file_key()
        );
    }

    #[test]
    fn test_encryption_dictionary() {
        let handler = SecurityHandler::new("u", "o");
        let dict = handler.encryption_dictionary();
        assert_eq!(dict.get("Filter"), Some("/Standard"));
        assert_eq!(dict.get("V"), Some("1"));
        assert_eq!(dict.get("R"), Some("2"));
        assert_eq!(dict.get("P"), Some("-4"));
        let o = dict.get("O").unwrap();
        assert_eq!(o.len(), 66);
        assert_eq!(o, o.to_uppercase());
    }

    #[test]
    fn test_encrypt_document() {
        let document = build_text_document("secret", &PdfConfig::default());
        let plain = document.get(4).unwrap().stream_data().unwrap().to_vec();

        let encrypted = encrypt_document(document, "user", "owner").unwrap();
        let encrypt_id = encrypted.encrypt().unwrap();
        assert_eq!(encrypt_id.number(), 6);
        assert_ne!(encrypted.get(4).unwrap().stream_data().unwrap(), plain.as_slice());

        let bytes = encrypted.to_bytes().unwrap();
        assert!(is_valid_pdf(&bytes));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Encrypt 6 0 R"));
        assert!(!text.contains("(secret) Tj"));
    }

    #[test]
    fn test_encrypt_twice_is_rejected() {
        let document = build_text_document("x", &PdfConfig::default());
        let encrypted = encrypt_document(document, "u", "o").unwrap();
        assert!(matches!(
            encrypt_document(encrypted, "u", "o"),
            Err(PdfError::StructuralPrecondition(_))
        ));
    }

    #[test]
    fn test_decrypt_roundtrip() {
        let original = build_text_document("round trip", &PdfConfig::default());
        let plain = original.get(4).unwrap().stream_data().unwrap().to_vec();
        let bytes = encrypt_pdf(&original.to_bytes().unwrap(), "user", "owner").unwrap();

        let parsed = parse_document(&bytes).unwrap();
        let decrypted = decrypt_document(parsed, "user").unwrap();
        assert_eq!(decrypted.encrypt(), None);
        assert!(!decrypted.contains(6));
        assert_eq!(decrypted.get(4).unwrap().stream_data().unwrap(), plain.as_slice());
    }

    #[test]
    fn test_decrypt_wrong_password() {
        let original = build_text_document("x", &PdfConfig::default());
        let bytes = encrypt_pdf(&original.to_bytes().unwrap(), "user", "owner").unwrap();
        let err = decrypt_pdf(&bytes, "guess").unwrap_err();
        assert!(matches!(err, PdfError::InvalidArgument(_)));
    }

    #[test]
    fn test_decrypt_plain_document() {
        let document = build_text_document("x", &PdfConfig::default());
        assert!(matches!(
            decrypt_document(document, "user"),
            Err(PdfError::StructuralPrecondition(_))
        ));
    }
}
