//! PMS5003 particulate sensor frame decoding.
//!
//! A frame is the magic pair `0x42 0x4D` followed by 30 bytes: fourteen
//! big-endian `u16` fields (declared length, six mass concentrations, six
//! particle counts, one reserved word) and a big-endian checksum. The checksum
//! is the wrapping 16-bit sum of the magic bytes and the 28 payload bytes.
//!
//! The parser only ever sees the 30 bytes after the magic pair; locating the
//! magic pair in a byte stream is the job of `stream::scanner`. Offsets live
//! in `layout`, safe reads and the checksum convention in `reader`.

pub mod encoder;
pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use encoder::{encode_body, encode_frame};
pub use error::Pms5003Error;
pub use parser::{SensorRecord, parse_frame};
