use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Every way the codec can fail, on both the decode and encode paths.
///
/// The wire grammar is symmetric (what the reader consumes, the writer
/// recomputes and re-emits), so a single enum covers both directions.
#[derive(Error, Debug)]
pub enum CodecError {
  #[error("read error: {0}")]
  Read(#[from] io::Error),

  #[error("string at byte {offset} is not null-terminated")]
  StringTerminator { offset: u64 },

  #[error("non-ASCII string encountered while writing {context}")]
  NonAsciiString { context: String },

  #[error("reserved field `{context}` at byte {offset} was expected to be zero but was {value}")]
  ReservedNonZero { context: String, offset: u64, value: i64 },

  #[error("object count ({objects}) does not match entity count ({entities})")]
  ObjectEntityCountMismatch { objects: i32, entities: i32 },

  #[error("entity declared a length of {declared} bytes but {consumed} were consumed by its properties")]
  NegativeEntityResidual { declared: i32, consumed: i64 },

  #[error("unknown {kind}: {tag}")]
  UnknownTag { kind: &'static str, tag: String },

  #[error("{context} declared a length of {declared} bytes but {actual} were written")]
  LengthMismatch { context: String, declared: i32, actual: i32 },

  #[error("UTF-8 encoding error: {0}")]
  Utf8(#[from] FromUtf8Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
