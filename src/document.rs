//! The document assembler: wires the header, object table, and entity
//! table together and handles the trailing opaque bytes at the very end
//! of the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cursor::{Reader, Writer};
use crate::entity::Entity;
use crate::errors::{CodecError, Result};
use crate::header::Header;
use crate::object::{read_object_table, write_object_table, Object};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
  pub object: Object,
  pub entity: Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub header: Header,
  pub entries: Vec<ObjectEntry>,
  pub trailing_bytes: Vec<u8>,
}

impl Document {
  pub fn read(bytes: &[u8]) -> Result<Self> {
    let mut reader = Reader::new(bytes);

    log::debug!("reading header");
    let header = Header::read(&mut reader)?;

    log::debug!("reading object table");
    let objects = read_object_table(&mut reader)?;
    log::info!("read {} objects", objects.len());

    let entity_count = reader.read_i32()?;
    if entity_count != objects.len() as i32 {
      return Err(CodecError::ObjectEntityCountMismatch { objects: objects.len() as i32, entities: entity_count });
    }

    let mut entries = Vec::with_capacity(objects.len());
    for (index, object) in objects.into_iter().enumerate() {
      let declared_length = reader.read_i32()?;
      log::debug!("reading entity {index} (declared length {declared_length})");
      let entity = Entity::read(&mut reader, object.is_actor(), declared_length)?;
      entries.push(ObjectEntry { object, entity });
    }

    let remaining = reader.remaining() as usize;
    let trailing_bytes = reader.read_hex(remaining)?;
    log::debug!("{} trailing bytes at end of file", trailing_bytes.len());

    Ok(Document { header, entries, trailing_bytes })
  }

  pub fn write(&self, authoring: bool) -> Result<Vec<u8>> {
    let mut writer = Writer::new();
    self.header.write(&mut writer)?;

    let objects: Vec<Object> = self.entries.iter().map(|entry| entry.object.clone()).collect();
    write_object_table(&mut writer, &objects)?;

    writer.write_i32(self.entries.len() as i32, true);
    for entry in &self.entries {
      entry.entity.write(&mut writer, authoring)?;
    }

    writer.write_hex(&self.trailing_bytes, true);
    Ok(writer.into_bytes())
  }
}

pub fn decode_file(path: &Path) -> Result<Document> {
  log::info!("decoding {}", path.display());
  let bytes = fs::read(path)?;
  Document::read(&bytes)
}

pub fn encode_file(path: &Path, document: &Document, authoring: bool) -> Result<()> {
  log::info!("encoding {}", path.display());
  let bytes = document.write(authoring)?;
  fs::write(path, bytes)?;
  Ok(())
}
