//! Frame synchronization over a byte source.
//!
//! `scanner` finds the magic sequence, `decoder` reads and validates the frame
//! that follows, and `session` drives both in a loop until the source fails.
//! Only `SourceError` is fatal; every other failure costs one frame and the
//! loop resynchronizes from the next byte.

pub mod decoder;
pub mod scanner;
pub mod session;

pub use decoder::decode_frame;
pub use scanner::find_next_frame;
pub use session::{RecordSink, SessionSummary, run_session};

use thiserror::Error;

use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("short read: need {needed} bytes, got {actual}")]
    ShortRead { needed: usize, actual: usize },
    #[error("checksum mismatch: computed {computed:#06x}, wire {wire:#06x}")]
    Checksum { computed: u16, wire: u16 },
    #[error("invalid frame length: {length}")]
    FrameLength { length: u16 },
}

impl DecodeError {
    /// Whether the session can continue by scanning for the next frame.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DecodeError::Source(_))
    }
}
