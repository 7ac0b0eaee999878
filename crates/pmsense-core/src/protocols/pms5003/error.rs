use thiserror::Error;

/// Errors returned by PMS5003 frame parsing.
///
/// # Examples
/// ```
/// use pmsense_core::protocols::pms5003::error::Pms5003Error;
///
/// let err = Pms5003Error::InvalidFrameLength { length: 20 };
/// assert!(err.to_string().contains("invalid frame length"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Pms5003Error {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("checksum mismatch: computed {computed:#06x}, wire {wire:#06x}")]
    ChecksumMismatch { computed: u16, wire: u16 },
    #[error("invalid frame length: {length} (expected 28)")]
    InvalidFrameLength { length: u16 },
}
