//! Stream encryption with RC4 and an MD5-derived 40-bit key

mod rc4;
mod security_handler;

pub use rc4::{rc4_encrypt, Rc4, Rc4Key};
pub use security_handler::{
    decrypt_document, decrypt_pdf, encrypt_document, encrypt_pdf, pad_password, SecurityHandler,
    KEY_LENGTH, PADDING, PERMISSIONS,
};
