//! The byte stream cursor: a forward-only read cursor with a byte counter,
//! and a forward-only write sink with a nestable length-frame stack.
//!
//! This is the single most important primitive in the codec (see
//! `DESIGN.md`): every length-prefixed payload in the format is written by
//! pushing a frame, writing its body with a per-write counted/uncounted
//! flag, then popping the frame to emit its length prefix.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read};

use crate::errors::{CodecError, Result};

/// Forward-only reader over a byte slice with a resettable `bytes_read`
/// counter, threaded explicitly (as a struct field) rather than through a
/// module-level global.
pub struct Reader<'a> {
  cursor: Cursor<&'a [u8]>,
  read_baseline: u64,
}

impl<'a> Reader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Reader { cursor: Cursor::new(bytes), read_baseline: 0 }
  }

  pub fn position(&self) -> u64 {
    self.cursor.position()
  }

  pub fn remaining(&self) -> u64 {
    (self.cursor.get_ref().len() as u64).saturating_sub(self.position())
  }

  /// Bytes consumed since the last `reset_bytes_read` call. The entity
  /// codec resets this at the start of each entity to measure progress
  /// against the declared entity length.
  pub fn bytes_read(&self) -> u64 {
    self.cursor.position() - self.read_baseline
  }

  pub fn reset_bytes_read(&mut self) {
    self.read_baseline = self.cursor.position();
  }

  pub fn read_i8(&mut self) -> Result<i8> {
    Ok(self.cursor.read_i8()?)
  }

  pub fn read_u8(&mut self) -> Result<u8> {
    Ok(self.cursor.read_u8()?)
  }

  pub fn read_i32(&mut self) -> Result<i32> {
    Ok(self.cursor.read_i32::<LittleEndian>()?)
  }

  pub fn read_i64(&mut self) -> Result<i64> {
    Ok(self.cursor.read_i64::<LittleEndian>()?)
  }

  pub fn read_f32(&mut self) -> Result<f32> {
    Ok(self.cursor.read_f32::<LittleEndian>()?)
  }

  /// Reads a raw, opaque run of `len` bytes. Used for regions whose
  /// grammar is not yet reverse-engineered.
  pub fn read_hex(&mut self, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    self.cursor.read_exact(&mut buf)?;
    Ok(buf)
  }

  /// Reads a reserved field that is defined to always be zero; fails if
  /// it isn't (spec error kind 3: reserved-non-zero).
  pub fn read_reserved_i32(&mut self, context: impl Into<String>) -> Result<()> {
    let offset = self.position();
    let value = self.read_i32()?;
    if value != 0 {
      return Err(CodecError::ReservedNonZero { context: context.into(), offset, value: value as i64 });
    }
    Ok(())
  }

  pub fn read_reserved_byte(&mut self, context: impl Into<String>) -> Result<()> {
    let offset = self.position();
    let value = self.read_i8()?;
    if value != 0 {
      return Err(CodecError::ReservedNonZero { context: context.into(), offset, value: value as i64 });
    }
    Ok(())
  }

  /// `i32` length, `L`. `L == 0` is an empty string with no further
  /// bytes. Otherwise `L - 1` ASCII bytes followed by exactly one
  /// `0x00`; a non-zero terminator is a fatal parse error.
  pub fn read_string(&mut self) -> Result<String> {
    let len = self.read_i32()?;
    if len == 0 {
      return Ok(String::new());
    }

    let mut chars = vec![0u8; (len - 1) as usize];
    self.cursor.read_exact(&mut chars)?;

    let terminator_offset = self.position();
    let terminator = self.read_u8()?;
    if terminator != 0 {
      return Err(CodecError::StringTerminator { offset: terminator_offset });
    }

    Ok(String::from_utf8(chars)?)
  }
}

/// A single nested write buffer: bytes accumulate here until the frame is
/// popped, at which point its counted length is emitted as an `i32`
/// prefix into the enclosing sink, followed by the buffered bytes.
#[derive(Default)]
struct Frame {
  buffer: Vec<u8>,
  length: i64,
}

/// Forward-only write sink with a nestable length-frame stack. Frames
/// nest arbitrarily; counted-vs-uncounted is a per-write flag, since some
/// bytes are physically present in a payload but defined to lie outside
/// its own length field's accounting (e.g. a `StructProperty`'s type tag).
#[derive(Default)]
pub struct Writer {
  frames: Vec<Frame>,
  out: Vec<u8>,
}

impl Writer {
  pub fn new() -> Self {
    Writer::default()
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.out
  }

  fn write_bytes(&mut self, bytes: &[u8], counted: bool) {
    match self.frames.last_mut() {
      Some(frame) => {
        frame.buffer.extend_from_slice(bytes);
        if counted {
          frame.length += bytes.len() as i64;
        }
      }
      None => self.out.extend_from_slice(bytes),
    }
  }

  pub fn write_i8(&mut self, value: i8, counted: bool) {
    let mut buf = [0u8; 1];
    buf.as_mut_slice().write_i8(value).unwrap();
    self.write_bytes(&buf, counted);
  }

  pub fn write_u8(&mut self, value: u8, counted: bool) {
    self.write_bytes(&[value], counted);
  }

  pub fn write_i32(&mut self, value: i32, counted: bool) {
    let mut buf = [0u8; 4];
    buf.as_mut_slice().write_i32::<LittleEndian>(value).unwrap();
    self.write_bytes(&buf, counted);
  }

  pub fn write_i64(&mut self, value: i64, counted: bool) {
    let mut buf = [0u8; 8];
    buf.as_mut_slice().write_i64::<LittleEndian>(value).unwrap();
    self.write_bytes(&buf, counted);
  }

  pub fn write_f32(&mut self, value: f32, counted: bool) {
    let mut buf = [0u8; 4];
    buf.as_mut_slice().write_f32::<LittleEndian>(value).unwrap();
    self.write_bytes(&buf, counted);
  }

  pub fn write_hex(&mut self, bytes: &[u8], counted: bool) {
    self.write_bytes(bytes, counted);
  }

  /// `L = len(value) + 1` if non-empty (ASCII bytes plus a trailing
  /// `0x00`), else `L = 0` with no further bytes.
  pub fn write_string(&mut self, value: &str, context: impl Into<String>, counted: bool) -> Result<()> {
    if !value.is_ascii() {
      return Err(CodecError::NonAsciiString { context: context.into() });
    }
    if value.is_empty() {
      self.write_i32(0, counted);
      return Ok(());
    }
    self.write_i32(value.len() as i32 + 1, counted);
    self.write_bytes(value.as_bytes(), counted);
    self.write_bytes(&[0u8], counted);
    Ok(())
  }

  /// Begins buffering all subsequent writes into a new length frame.
  pub fn push_frame(&mut self) {
    self.frames.push(Frame::default());
  }

  /// The running counted length of the currently open frame. Used by the
  /// InventoryItem quirk, which overrides this value rather than letting
  /// it fall out of the bytes actually written.
  pub fn current_frame_length(&self) -> i64 {
    self.frames.last().expect("current_frame_length called with no open frame").length
  }

  pub fn set_current_frame_length(&mut self, length: i64) {
    self.frames.last_mut().expect("set_current_frame_length called with no open frame").length = length;
  }

  /// Pops the current length frame, writing its counted length as an
  /// `i32` into the enclosing sink followed by the frame's buffered
  /// bytes, and returns the computed length.
  pub fn pop_frame(&mut self) -> i32 {
    let frame = self.frames.pop().expect("pop_frame called with no open frame");
    let length = frame.length as i32;
    self.write_i32(length, true);
    self.write_bytes(&frame.buffer, true);
    length
  }

  /// Pops the current length frame and checks the computed length
  /// against a previously-declared one (spec error kind 7). In strict
  /// mode a mismatch is fatal; in authoring mode it is downgraded to a
  /// warning and the freshly computed length is kept.
  pub fn pop_frame_checked(
    &mut self,
    context: impl Into<String>,
    declared: i32,
    authoring: bool,
  ) -> Result<i32> {
    let actual = self.pop_frame();
    if actual != declared {
      let context = context.into();
      if authoring {
        log::warn!(
          "{context}: recomputed length {actual} differs from declared length {declared}; keeping recomputed value (authoring mode)"
        );
      } else {
        return Err(CodecError::LengthMismatch { context, declared, actual });
      }
    }
    Ok(actual)
  }
}
