mod dictionary;
mod object;
mod reference;

pub use dictionary::{parse_numbers, Dictionary};
pub use object::{IndirectObject, ObjectBody, ObjectRole};
pub use reference::{references_in, remove_reference, rewrite_reference, rewrite_references, ObjectId};
