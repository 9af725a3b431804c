pub mod cursor;
pub mod document;
pub mod entity;
pub mod errors;
pub mod header;
pub mod object;
pub mod property;

pub use cursor::{Reader, Writer};
pub use document::{decode_file, encode_file, Document, ObjectEntry};
pub use entity::{Entity, EntityNames};
pub use errors::{CodecError, Result};
pub use header::Header;
pub use object::{ActorObject, Object, ObjectReference, ReferenceObject, Transform};
pub use property::{Property, PropertyValue};
