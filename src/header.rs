//! The save header: a fixed sequence of scalar fields preceding the
//! object table. Always present, never length-prefixed as a whole.

use serde::{Deserialize, Serialize};

use crate::cursor::{Reader, Writer};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
  pub save_header_type: i32,
  pub save_version: i32,
  pub build_version: i32,
  pub map_name: String,
  pub map_options: String,
  pub session_name: String,
  pub play_duration_seconds: i32,
  /// FDateTime ticks (100ns units since 0001-01-01), not a Unix
  /// timestamp. Always 8 bytes on the wire.
  pub save_date_time: i64,
  pub session_visibility: i8,
}

impl Header {
  pub fn read(reader: &mut Reader) -> Result<Self> {
    Ok(Header {
      save_header_type: reader.read_i32()?,
      save_version: reader.read_i32()?,
      build_version: reader.read_i32()?,
      map_name: reader.read_string()?,
      map_options: reader.read_string()?,
      session_name: reader.read_string()?,
      play_duration_seconds: reader.read_i32()?,
      save_date_time: reader.read_i64()?,
      session_visibility: reader.read_i8()?,
    })
  }

  pub fn write(&self, writer: &mut Writer) -> Result<()> {
    writer.write_i32(self.save_header_type, true);
    writer.write_i32(self.save_version, true);
    writer.write_i32(self.build_version, true);
    writer.write_string(&self.map_name, "header.map_name", true)?;
    writer.write_string(&self.map_options, "header.map_options", true)?;
    writer.write_string(&self.session_name, "header.session_name", true)?;
    writer.write_i32(self.play_duration_seconds, true);
    writer.write_i64(self.save_date_time, true);
    writer.write_i8(self.session_visibility, true);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> Header {
    Header {
      save_header_type: 8,
      save_version: 41,
      build_version: 200825,
      map_name: "Persistent_Level".to_string(),
      map_options: String::new(),
      session_name: "my save".to_string(),
      play_duration_seconds: 3600,
      save_date_time: 637_845_000_000_000_000,
      session_visibility: 1,
    }
  }

  #[test]
  fn header_round_trips() {
    let header = sample();
    let mut writer = Writer::new();
    header.write(&mut writer).unwrap();
    let bytes = writer.into_bytes();

    let mut reader = Reader::new(&bytes);
    let read_back = Header::read(&mut reader).unwrap();
    assert_eq!(read_back, header);
  }

  #[test]
  fn save_date_time_is_always_eight_bytes() {
    let header = sample();
    let mut writer = Writer::new();
    header.write(&mut writer).unwrap();
    let bytes = writer.into_bytes();

    // save_header_type, save_version, build_version: 3 i32s = 12 bytes.
    let mut reader = Reader::new(&bytes);
    reader.read_i32().unwrap();
    reader.read_i32().unwrap();
    reader.read_i32().unwrap();
    reader.read_string().unwrap();
    reader.read_string().unwrap();
    reader.read_string().unwrap();
    reader.read_i32().unwrap();
    let before = reader.position();
    reader.read_i64().unwrap();
    assert_eq!(reader.position() - before, 8);
  }
}
