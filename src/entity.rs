//! Entities: the per-object property bag appended after the object
//! table, one per entry, in the same order. Actor entities carry extra
//! identity fields and a child reference list; plain objects carry only
//! their properties.

use serde::{Deserialize, Serialize};

use crate::cursor::{Reader, Writer};
use crate::errors::{CodecError, Result};
use crate::object::ObjectReference;
use crate::property::{read_property_list, write_property_list, Property};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNames {
  pub level_name: String,
  pub path_name: String,
  pub children: Vec<ObjectReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
  /// Present for actor entities, absent for plain objects.
  pub names: Option<EntityNames>,
  pub properties: Vec<Property>,
  /// Bytes left over once the properties are exhausted but the entity's
  /// declared length hasn't. Preserved so the stream round-trips even
  /// through regions whose grammar we haven't reverse-engineered.
  pub trailing_bytes: Vec<u8>,
}

impl Entity {
  /// `declared_length` is the `i32` read immediately before this entity
  /// in the stream; `with_names` comes from the corresponding object
  /// entry's tag (actor vs. reference).
  pub fn read(reader: &mut Reader, with_names: bool, declared_length: i32) -> Result<Self> {
    reader.reset_bytes_read();

    let names = if with_names {
      let level_name = reader.read_string()?;
      let path_name = reader.read_string()?;
      let child_count = reader.read_i32()?;
      let mut children = Vec::with_capacity(child_count.max(0) as usize);
      for _ in 0..child_count {
        children.push(ObjectReference::read(reader)?);
      }
      Some(EntityNames { level_name, path_name, children })
    } else {
      None
    };

    let properties = read_property_list(reader)?;

    let consumed = reader.bytes_read() as i64;
    let missing = declared_length as i64 - consumed;
    let trailing_bytes = if missing > 0 {
      reader.read_hex(missing as usize)?
    } else if missing < 0 {
      return Err(CodecError::NegativeEntityResidual { declared: declared_length, consumed });
    } else {
      Vec::new()
    };

    Ok(Entity { names, properties, trailing_bytes })
  }

  /// Writes this entity's own length frame (names, properties, trailing
  /// bytes) and returns the freshly computed length. Unlike properties,
  /// an entity's length is never checked against a prior value — it is
  /// always recomputed.
  pub fn write(&self, writer: &mut Writer, authoring: bool) -> Result<i32> {
    writer.push_frame();
    if let Some(names) = &self.names {
      writer.write_string(&names.level_name, "entity.level_name", true)?;
      writer.write_string(&names.path_name, "entity.path_name", true)?;
      writer.write_i32(names.children.len() as i32, true);
      for child in &names.children {
        child.write(writer)?;
      }
    }
    write_property_list(writer, &self.properties, authoring)?;
    writer.write_hex(&self.trailing_bytes, true);
    Ok(writer.pop_frame())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::property::{Property, PropertyValue};

  fn int_property(name: &str, value: i32) -> Property {
    Property { name: name.to_string(), type_tag: "IntProperty".to_string(), declared_length: 4, value: PropertyValue::Int(value) }
  }

  #[test]
  fn reference_entity_round_trips_with_no_names() {
    let entity = Entity { names: None, properties: vec![int_property("mHealth", 100)], trailing_bytes: Vec::new() };

    let mut writer = Writer::new();
    let declared_length = entity.write(&mut writer, false).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    let length = reader.read_i32().unwrap();
    assert_eq!(length, declared_length);
    let read_back = Entity::read(&mut reader, false, declared_length).unwrap();
    assert_eq!(read_back, entity);
  }

  #[test]
  fn empty_properties_entity_is_just_the_none_sentinel() {
    let entity = Entity { names: None, properties: Vec::new(), trailing_bytes: Vec::new() };
    let mut writer = Writer::new();
    entity.write(&mut writer, false).unwrap();
    let bytes = writer.into_bytes();

    // length prefix (4) + "None" length-prefixed string (4 + 4 + 1 = 9).
    assert_eq!(bytes.len(), 4 + 9);
  }

  #[test]
  fn actor_entity_round_trips_with_names_and_children() {
    let entity = Entity {
      names: Some(EntityNames {
        level_name: "Persistent_Level".to_string(),
        path_name: "Persistent_Level.Actor_1".to_string(),
        children: vec![ObjectReference { level_name: "Persistent_Level".to_string(), path_name: "Child_1".to_string() }],
      }),
      properties: vec![int_property("mNumChildren", 1)],
      trailing_bytes: Vec::new(),
    };

    let mut writer = Writer::new();
    let declared_length = entity.write(&mut writer, false).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    reader.read_i32().unwrap();
    let read_back = Entity::read(&mut reader, true, declared_length).unwrap();
    assert_eq!(read_back, entity);
  }

  #[test]
  fn trailing_bytes_are_preserved_when_shorter_than_declared_length() {
    let entity = Entity { names: None, properties: Vec::new(), trailing_bytes: vec![0xDE, 0xAD] };
    let mut writer = Writer::new();
    let declared_length = entity.write(&mut writer, false).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    reader.read_i32().unwrap();
    let read_back = Entity::read(&mut reader, false, declared_length).unwrap();
    assert_eq!(read_back.trailing_bytes, vec![0xDE, 0xAD]);
  }

  #[test]
  fn negative_residual_is_fatal() {
    let entity = Entity { names: None, properties: vec![int_property("mHealth", 100)], trailing_bytes: Vec::new() };
    let mut writer = Writer::new();
    let declared_length = entity.write(&mut writer, false).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    reader.read_i32().unwrap();
    let err = Entity::read(&mut reader, false, declared_length - 1).unwrap_err();
    assert!(matches!(err, CodecError::NegativeEntityResidual { .. }));
  }
}
