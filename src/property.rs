//! The property tree: a recursive, tagged, length-prefixed grammar. Every
//! property carries a name, a type tag, a declared length the writer
//! recomputes and checks, and a value whose shape depends on the tag.
//!
//! Property lists (entity bodies, struct bodies, array/map elements) are
//! all terminated the same way: a property named `"None"` with no type,
//! length, or value fields of its own.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

use crate::cursor::{Reader, Writer};
use crate::errors::{CodecError, Result};
use crate::object::ObjectReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum PropertyTag {
  IntProperty,
  BoolProperty,
  FloatProperty,
  StrProperty,
  NameProperty,
  TextProperty,
  ByteProperty,
  EnumProperty,
  ObjectProperty,
  StructProperty,
  ArrayProperty,
  MapProperty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
  pub name: String,
  pub type_tag: String,
  pub declared_length: i32,
  pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
  Int(i32),
  Bool(i8),
  Float(f32),
  Str(String),
  Name(String),
  Text(TextValue),
  Byte(ByteProperty),
  Enum(EnumValue),
  Object(ObjectReference),
  Struct(StructProperty),
  Array(ArrayPropertyValue),
  Map(MapPropertyValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
  pub unknown: [u8; 13],
  pub value: String,
}

/// `unk1 == "None"` reads `unk2` as a raw byte; anything else reads it as
/// a string. The writer's own discriminator is `unk1 == "EGamePhase"`,
/// not `"None"` — a known asymmetry in the original tool, reproduced here
/// rather than reconciled (see `DESIGN.md`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByteProperty {
  pub unk1: String,
  pub value: ByteValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ByteValue {
  Byte(i8),
  Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
  pub enum_name: String,
  pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructProperty {
  pub struct_type: String,
  pub unknown: [u8; 17],
  pub body: StructBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructBody {
  Vector3 { x: f32, y: f32, z: f32 },
  Box { min: [f32; 3], max: [f32; 3], is_valid: i8 },
  LinearColor { r: f32, g: f32, b: f32, a: f32 },
  Quat { a: f32, b: f32, c: f32, d: f32 },
  /// Shared by `Transform`, `RemovedInstanceArray` and `InventoryStack`,
  /// which are all just a nested property list under a different name.
  PropertyList(Vec<Property>),
  InventoryItem(InventoryItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
  pub unk1: String,
  pub item_name: String,
  pub level_name: String,
  pub path_name: String,
  pub property: Box<Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayPropertyValue {
  pub item_type: String,
  pub items: ArrayItems,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayItems {
  Int(Vec<i32>),
  Object(Vec<ObjectReference>),
  Struct(ArrayStructItems),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayStructItems {
  pub struct_name: String,
  pub struct_type: String,
  pub declared_struct_size: i32,
  pub inner_type: String,
  pub unknown: [u8; 17],
  pub elements: Vec<Vec<Property>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPropertyValue {
  pub key_type: String,
  pub value_type: String,
  pub entries: Vec<MapEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEntry {
  pub key: i32,
  pub properties: Vec<Property>,
}

/// Reads properties until the `"None"` terminator, which is consumed but
/// not returned.
pub fn read_property_list(reader: &mut Reader) -> Result<Vec<Property>> {
  let mut properties = Vec::new();
  while let Some(property) = read_property(reader)? {
    properties.push(property);
  }
  Ok(properties)
}

/// Reads one property, or `None` if the name read was the list terminator.
pub fn read_property(reader: &mut Reader) -> Result<Option<Property>> {
  let name = reader.read_string()?;
  if name == "None" {
    return Ok(None);
  }

  let type_tag = reader.read_string()?;
  let declared_length = reader.read_i32()?;
  reader.read_reserved_i32(format!("{name} ({type_tag})"))?;

  let value = read_property_value(reader, &name, &type_tag)?;
  Ok(Some(Property { name, type_tag, declared_length, value }))
}

fn read_property_value(reader: &mut Reader, name: &str, type_tag: &str) -> Result<PropertyValue> {
  let tag = PropertyTag::from_str(type_tag)
    .map_err(|_| CodecError::UnknownTag { kind: "property type", tag: type_tag.to_string() })?;

  Ok(match tag {
    PropertyTag::IntProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Int(reader.read_i32()?)
    }
    PropertyTag::BoolProperty => {
      let value = reader.read_i8()?;
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Bool(value)
    }
    PropertyTag::FloatProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Float(reader.read_f32()?)
    }
    PropertyTag::StrProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Str(reader.read_string()?)
    }
    PropertyTag::NameProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Name(reader.read_string()?)
    }
    PropertyTag::TextProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      let mut unknown = [0u8; 13];
      unknown.copy_from_slice(&reader.read_hex(13)?);
      let value = reader.read_string()?;
      PropertyValue::Text(TextValue { unknown, value })
    }
    PropertyTag::ByteProperty => {
      let unk1 = reader.read_string()?;
      reader.read_reserved_byte(format!("{name}.pad"))?;
      let value =
        if unk1 == "None" { ByteValue::Byte(reader.read_i8()?) } else { ByteValue::Name(reader.read_string()?) };
      PropertyValue::Byte(ByteProperty { unk1, value })
    }
    PropertyTag::EnumProperty => {
      let enum_name = reader.read_string()?;
      reader.read_reserved_byte(format!("{name}.pad"))?;
      let value = reader.read_string()?;
      PropertyValue::Enum(EnumValue { enum_name, value })
    }
    PropertyTag::ObjectProperty => {
      reader.read_reserved_byte(format!("{name}.pad"))?;
      PropertyValue::Object(ObjectReference::read(reader)?)
    }
    PropertyTag::StructProperty => {
      let struct_type = reader.read_string()?;
      let mut unknown = [0u8; 17];
      unknown.copy_from_slice(&reader.read_hex(17)?);
      let body = read_struct_body(reader, &struct_type)?;
      PropertyValue::Struct(StructProperty { struct_type, unknown, body })
    }
    PropertyTag::ArrayProperty => {
      let item_type = reader.read_string()?;
      reader.read_reserved_byte(format!("{name}.pad"))?;
      let count = reader.read_i32()?;
      let items = read_array_items(reader, &item_type, count)?;
      PropertyValue::Array(ArrayPropertyValue { item_type, items })
    }
    PropertyTag::MapProperty => {
      let key_type = reader.read_string()?;
      let value_type = reader.read_string()?;
      for _ in 0..5 {
        reader.read_reserved_byte(format!("{name}.pad"))?;
      }
      let count = reader.read_i32()?;
      let mut entries = Vec::with_capacity(count.max(0) as usize);
      for _ in 0..count {
        let key = reader.read_i32()?;
        let properties = read_property_list(reader)?;
        entries.push(MapEntry { key, properties });
      }
      PropertyValue::Map(MapPropertyValue { key_type, value_type, entries })
    }
  })
}

fn read_struct_body(reader: &mut Reader, struct_type: &str) -> Result<StructBody> {
  Ok(match struct_type {
    "Vector" | "Rotator" => {
      StructBody::Vector3 { x: reader.read_f32()?, y: reader.read_f32()?, z: reader.read_f32()? }
    }
    "Box" => {
      let min = [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?];
      let max = [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?];
      let is_valid = reader.read_i8()?;
      StructBody::Box { min, max, is_valid }
    }
    "LinearColor" => StructBody::LinearColor {
      r: reader.read_f32()?,
      g: reader.read_f32()?,
      b: reader.read_f32()?,
      a: reader.read_f32()?,
    },
    "Transform" | "RemovedInstanceArray" | "InventoryStack" => {
      StructBody::PropertyList(read_property_list(reader)?)
    }
    "Quat" => StructBody::Quat {
      a: reader.read_f32()?,
      b: reader.read_f32()?,
      c: reader.read_f32()?,
      d: reader.read_f32()?,
    },
    "InventoryItem" => {
      let unk1 = reader.read_string()?;
      let item_name = reader.read_string()?;
      let level_name = reader.read_string()?;
      let path_name = reader.read_string()?;
      // The inner property's own "None" terminator belongs to the
      // enclosing struct, not to this single-element list, so we read
      // exactly one property rather than calling read_property_list.
      let property = read_property(reader)?.ok_or_else(|| CodecError::UnknownTag {
        kind: "inventory item inner property",
        tag: "None".to_string(),
      })?;
      StructBody::InventoryItem(InventoryItem { unk1, item_name, level_name, path_name, property: Box::new(property) })
    }
    other => return Err(CodecError::UnknownTag { kind: "struct_type", tag: other.to_string() }),
  })
}

fn read_array_items(reader: &mut Reader, item_type: &str, count: i32) -> Result<ArrayItems> {
  Ok(match item_type {
    "IntProperty" => {
      let mut values = Vec::with_capacity(count.max(0) as usize);
      for _ in 0..count {
        values.push(reader.read_i32()?);
      }
      ArrayItems::Int(values)
    }
    "ObjectProperty" => {
      let mut values = Vec::with_capacity(count.max(0) as usize);
      for _ in 0..count {
        values.push(ObjectReference::read(reader)?);
      }
      ArrayItems::Object(values)
    }
    "StructProperty" => {
      let struct_name = reader.read_string()?;
      let struct_type = reader.read_string()?;
      let declared_struct_size = reader.read_i32()?;
      reader.read_reserved_i32("array_struct.pad")?;
      let inner_type = reader.read_string()?;
      let mut unknown = [0u8; 17];
      unknown.copy_from_slice(&reader.read_hex(17)?);
      let mut elements = Vec::with_capacity(count.max(0) as usize);
      for _ in 0..count {
        elements.push(read_property_list(reader)?);
      }
      ArrayItems::Struct(ArrayStructItems { struct_name, struct_type, declared_struct_size, inner_type, unknown, elements })
    }
    other => return Err(CodecError::UnknownTag { kind: "item_type", tag: other.to_string() }),
  })
}

/// Writes each property followed by the `"None"` list terminator.
pub fn write_property_list(writer: &mut Writer, properties: &[Property], authoring: bool) -> Result<()> {
  for property in properties {
    write_property(writer, property, authoring)?;
  }
  write_none(writer);
  Ok(())
}

pub fn write_none(writer: &mut Writer) {
  writer.write_string("None", "property.name", true).expect("\"None\" is ASCII");
}

/// Writes `name`, `type_tag`, then opens this property's own length
/// frame (the reserved `i32 = 0` lives inside it, uncounted) before
/// dispatching on the value and popping the frame against
/// `declared_length`.
pub fn write_property(writer: &mut Writer, property: &Property, authoring: bool) -> Result<()> {
  writer.write_string(&property.name, "property.name", true)?;
  writer.write_string(&property.type_tag, "property.type_tag", true)?;
  writer.push_frame();
  writer.write_i32(0, false);
  write_property_value(writer, property, authoring)?;
  let context = format!("{} ({})", property.name, property.type_tag);
  writer.pop_frame_checked(context, property.declared_length, authoring)?;
  Ok(())
}

fn write_property_value(writer: &mut Writer, property: &Property, authoring: bool) -> Result<()> {
  match &property.value {
    PropertyValue::Int(v) => {
      writer.write_i8(0, false);
      writer.write_i32(*v, true);
    }
    PropertyValue::Bool(v) => {
      writer.write_i8(*v, false);
      writer.write_i8(0, false);
    }
    PropertyValue::Float(v) => {
      writer.write_i8(0, false);
      writer.write_f32(*v, true);
    }
    PropertyValue::Str(v) => {
      writer.write_i8(0, false);
      writer.write_string(v, format!("{}.value", property.name), true)?;
    }
    PropertyValue::Name(v) => {
      writer.write_i8(0, false);
      writer.write_string(v, format!("{}.value", property.name), true)?;
    }
    PropertyValue::Text(t) => {
      writer.write_i8(0, false);
      writer.write_hex(&t.unknown, true);
      writer.write_string(&t.value, format!("{}.value", property.name), true)?;
    }
    PropertyValue::Byte(b) => {
      writer.write_string(&b.unk1, format!("{}.unk1", property.name), false)?;
      writer.write_i8(0, false);
      match (b.unk1 == "EGamePhase", &b.value) {
        (true, ByteValue::Name(name)) => {
          writer.write_string(name, format!("{}.unk2", property.name), true)?;
        }
        (false, ByteValue::Byte(raw)) => {
          writer.write_i8(*raw, true);
        }
        _ => {
          return Err(CodecError::UnknownTag { kind: "byte property discriminator", tag: b.unk1.clone() });
        }
      }
    }
    PropertyValue::Enum(e) => {
      writer.write_string(&e.enum_name, format!("{}.enum_name", property.name), false)?;
      writer.write_i8(0, false);
      writer.write_string(&e.value, format!("{}.value", property.name), true)?;
    }
    PropertyValue::Object(o) => {
      writer.write_i8(0, false);
      o.write(writer)?;
    }
    PropertyValue::Struct(s) => write_struct_property(writer, property, s, authoring)?,
    PropertyValue::Array(a) => write_array_property(writer, property, a, authoring)?,
    PropertyValue::Map(m) => write_map_property(writer, property, m, authoring)?,
  }
  Ok(())
}

fn write_struct_property(writer: &mut Writer, property: &Property, s: &StructProperty, authoring: bool) -> Result<()> {
  writer.write_string(&s.struct_type, format!("{}.struct_type", property.name), false)?;
  writer.write_hex(&s.unknown, false);
  match &s.body {
    StructBody::Vector3 { x, y, z } => {
      writer.write_f32(*x, true);
      writer.write_f32(*y, true);
      writer.write_f32(*z, true);
    }
    StructBody::Box { min, max, is_valid } => {
      for v in min {
        writer.write_f32(*v, true);
      }
      for v in max {
        writer.write_f32(*v, true);
      }
      writer.write_i8(*is_valid, true);
    }
    StructBody::LinearColor { r, g, b, a } => {
      writer.write_f32(*r, true);
      writer.write_f32(*g, true);
      writer.write_f32(*b, true);
      writer.write_f32(*a, true);
    }
    StructBody::Quat { a, b, c, d } => {
      writer.write_f32(*a, true);
      writer.write_f32(*b, true);
      writer.write_f32(*c, true);
      writer.write_f32(*d, true);
    }
    StructBody::PropertyList(props) => {
      write_property_list(writer, props, authoring)?;
    }
    StructBody::InventoryItem(item) => {
      writer.write_string(&item.unk1, format!("{}.unk1", property.name), false)?;
      writer.write_string(&item.item_name, format!("{}.item_name", property.name), true)?;
      writer.write_string(&item.level_name, format!("{}.level_name", property.name), true)?;
      writer.write_string(&item.path_name, format!("{}.path_name", property.name), true)?;
      // The enclosing frame's length is forced to 4 bytes past its value
      // just before writing the inner property, regardless of how long
      // that property's own encoding turns out to be.
      let pre_write_length = writer.current_frame_length();
      write_property(writer, &item.property, authoring)?;
      writer.set_current_frame_length(pre_write_length + 4);
    }
  }
  Ok(())
}

fn write_array_property(writer: &mut Writer, property: &Property, a: &ArrayPropertyValue, authoring: bool) -> Result<()> {
  writer.write_string(&a.item_type, format!("{}.item_type", property.name), false)?;
  writer.write_i8(0, false);
  match &a.items {
    ArrayItems::Int(values) => {
      writer.write_i32(values.len() as i32, true);
      for v in values {
        writer.write_i32(*v, true);
      }
    }
    ArrayItems::Object(values) => {
      writer.write_i32(values.len() as i32, true);
      for v in values {
        v.write(writer)?;
      }
    }
    ArrayItems::Struct(s) => {
      writer.write_i32(s.elements.len() as i32, true);
      writer.write_string(&s.struct_name, format!("{}.struct_name", property.name), true)?;
      writer.write_string(&s.struct_type, format!("{}.struct_type", property.name), true)?;
      writer.push_frame();
      writer.write_i32(0, false);
      writer.write_string(&s.inner_type, format!("{}.inner_type", property.name), false)?;
      writer.write_hex(&s.unknown, false);
      for element in &s.elements {
        write_property_list(writer, element, authoring)?;
      }
      let context = format!("{}.struct_size", property.name);
      writer.pop_frame_checked(context, s.declared_struct_size, authoring)?;
    }
  }
  Ok(())
}

fn write_map_property(writer: &mut Writer, property: &Property, m: &MapPropertyValue, authoring: bool) -> Result<()> {
  writer.write_string(&m.key_type, format!("{}.key_type", property.name), false)?;
  writer.write_string(&m.value_type, format!("{}.value_type", property.name), false)?;
  writer.write_i8(0, false);
  // Physically the fifth of the five reserved zero bytes, but the
  // original tool counts it towards the property's length while the
  // other four are not. Preserved verbatim.
  writer.write_i32(0, true);
  writer.write_i32(m.entries.len() as i32, true);
  for entry in &m.entries {
    writer.write_i32(entry.key, true);
    write_property_list(writer, &entry.properties, authoring)?;
  }
  Ok(())
}
