//! The object/actor table: a count followed by `count` tagged records,
//! each either a `Reference` or an `Actor`.

use serde::{Deserialize, Serialize};

use crate::cursor::{Reader, Writer};
use crate::errors::{CodecError, Result};

/// A `(level_name, path_name)` pair identifying another object. Used both
/// as a standalone reference (`ObjectProperty`, entity children) and
/// embedded in the two object variants below.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
  pub level_name: String,
  pub path_name: String,
}

impl ObjectReference {
  pub fn read(reader: &mut Reader) -> Result<Self> {
    Ok(ObjectReference {
      level_name: reader.read_string()?,
      path_name: reader.read_string()?,
    })
  }

  pub fn write(&self, writer: &mut Writer) -> Result<()> {
    writer.write_string(&self.level_name, "object_reference.level_name", true)?;
    writer.write_string(&self.path_name, "object_reference.path_name", true)?;
    Ok(())
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
  pub rotation: [f32; 4],
  pub translation: [f32; 3],
  pub scale3d: [f32; 3],
}

impl Transform {
  pub fn read(reader: &mut Reader) -> Result<Self> {
    let mut rotation = [0f32; 4];
    for v in rotation.iter_mut() {
      *v = reader.read_f32()?;
    }
    let mut translation = [0f32; 3];
    for v in translation.iter_mut() {
      *v = reader.read_f32()?;
    }
    let mut scale3d = [0f32; 3];
    for v in scale3d.iter_mut() {
      *v = reader.read_f32()?;
    }
    Ok(Transform { rotation, translation, scale3d })
  }

  pub fn write(&self, writer: &mut Writer) {
    for v in self.rotation {
      writer.write_f32(v, true);
    }
    for v in self.translation {
      writer.write_f32(v, true);
    }
    for v in self.scale3d {
      writer.write_f32(v, true);
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceObject {
  pub class_name: String,
  pub level_name: String,
  pub path_name: String,
  pub outer_path_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorObject {
  pub class_name: String,
  pub level_name: String,
  pub path_name: String,
  pub need_transform: i32,
  pub transform: Transform,
  pub was_placed_in_level: i32,
}

/// Tagged union with two variants; the on-disk tag is an `i32`,
/// `0` = Reference, `1` = Actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Object {
  Reference(ReferenceObject),
  Actor(ActorObject),
}

impl Object {
  fn read(reader: &mut Reader) -> Result<Self> {
    let tag = reader.read_i32()?;
    match tag {
      0 => {
        let class_name = reader.read_string()?;
        let level_name = reader.read_string()?;
        let path_name = reader.read_string()?;
        let outer_path_name = reader.read_string()?;
        Ok(Object::Reference(ReferenceObject { class_name, level_name, path_name, outer_path_name }))
      }
      1 => {
        let class_name = reader.read_string()?;
        let level_name = reader.read_string()?;
        let path_name = reader.read_string()?;
        let need_transform = reader.read_i32()?;
        let transform = Transform::read(reader)?;
        let was_placed_in_level = reader.read_i32()?;
        Ok(Object::Actor(ActorObject {
          class_name,
          level_name,
          path_name,
          need_transform,
          transform,
          was_placed_in_level,
        }))
      }
      other => Err(CodecError::UnknownTag { kind: "object tag", tag: other.to_string() }),
    }
  }

  fn write(&self, writer: &mut Writer) -> Result<()> {
    match self {
      Object::Reference(o) => {
        writer.write_i32(0, true);
        writer.write_string(&o.class_name, "object.class_name", true)?;
        writer.write_string(&o.level_name, "object.level_name", true)?;
        writer.write_string(&o.path_name, "object.path_name", true)?;
        writer.write_string(&o.outer_path_name, "object.outer_path_name", true)?;
      }
      Object::Actor(a) => {
        writer.write_i32(1, true);
        writer.write_string(&a.class_name, "actor.class_name", true)?;
        writer.write_string(&a.level_name, "actor.level_name", true)?;
        writer.write_string(&a.path_name, "actor.path_name", true)?;
        writer.write_i32(a.need_transform, true);
        a.transform.write(writer);
        writer.write_i32(a.was_placed_in_level, true);
      }
    }
    Ok(())
  }

  pub fn is_actor(&self) -> bool {
    matches!(self, Object::Actor(_))
  }
}

/// Reads the `i32 count` followed by `count` tagged records.
pub fn read_object_table(reader: &mut Reader) -> Result<Vec<Object>> {
  let count = reader.read_i32()?;
  let mut objects = Vec::with_capacity(count.max(0) as usize);
  for _ in 0..count {
    objects.push(Object::read(reader)?);
  }
  Ok(objects)
}

/// Writes `i32 count` followed by each object's tagged record.
pub fn write_object_table(writer: &mut Writer, objects: &[Object]) -> Result<()> {
  writer.write_i32(objects.len() as i32, true);
  for object in objects {
    object.write(writer)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_actor() -> Object {
    Object::Actor(ActorObject {
      class_name: "/Script/FactoryGame.FGBuildable".to_string(),
      level_name: "Persistent_Level".to_string(),
      path_name: "Persistent_Level.Buildable_1".to_string(),
      need_transform: 1,
      transform: Transform {
        rotation: [0.0, 0.0, 0.0, 1.0],
        translation: [100.0, 200.0, 300.0],
        scale3d: [1.0, 1.0, 1.0],
      },
      was_placed_in_level: 1,
    })
  }

  fn sample_reference() -> Object {
    Object::Reference(ReferenceObject {
      class_name: "/Script/FactoryGame.FGPlayerState".to_string(),
      level_name: "Persistent_Level".to_string(),
      path_name: "Persistent_Level.PlayerState_1".to_string(),
      outer_path_name: String::new(),
    })
  }

  #[test]
  fn object_table_round_trips() {
    let objects = vec![sample_reference(), sample_actor()];
    let mut writer = Writer::new();
    write_object_table(&mut writer, &objects).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    let read_back = read_object_table(&mut reader).unwrap();
    assert_eq!(read_back, objects);
  }

  #[test]
  fn empty_object_table_is_just_a_zero_count() {
    let mut writer = Writer::new();
    write_object_table(&mut writer, &[]).unwrap();
    assert_eq!(writer.into_bytes(), 0i32.to_le_bytes());
  }

  #[test]
  fn is_actor_distinguishes_variants() {
    assert!(sample_actor().is_actor());
    assert!(!sample_reference().is_actor());
  }

  #[test]
  fn unknown_object_tag_is_fatal() {
    let bytes = 2i32.to_le_bytes();
    let mut reader = Reader::new(&bytes);
    let err = Object::read(&mut reader).unwrap_err();
    assert!(matches!(err, CodecError::UnknownTag { kind: "object tag", .. }));
  }
}
