//! pmsense core library: PMS5003 frame decoding over unreliable byte streams.
//!
//! Byte sources feed the stream layer, which resynchronizes on the magic
//! sequence, drives the protocol decoder (layout/reader/parser) and updates a
//! shared metrics registry. Parsing is byte-oriented and side-effect free; all
//! I/O is isolated in `source` modules and every read failure is returned to
//! the caller as a typed error.
//!
//! Invariants:
//! - No reading is published unless its checksum matches and its declared
//!   length is 28.
//! - Each health counter is incremented exactly once per event.
//! - The scanner never backtracks and buffers at most two bytes.
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//!
//! use pmsense_core::protocols::pms5003::{SensorRecord, encode_frame};
//! use pmsense_core::{MetricsRegistry, ReaderSource, SourceError, run_session};
//!
//! let record = SensorRecord { frame_length: 28, pm2_5_env: 8, ..Default::default() };
//! let mut bytes = vec![0x00, 0x42];
//! bytes.extend_from_slice(&encode_frame(&record));
//!
//! let registry = MetricsRegistry::new();
//! let mut source = ReaderSource::new(Cursor::new(bytes));
//! let mut sink = |_: &SensorRecord| {};
//! let err = run_session(&mut source, &registry, &mut sink, None).unwrap_err();
//! assert!(matches!(err, SourceError::EndOfStream));
//! assert_eq!(registry.snapshot().bytes_skipped, 2);
//! assert_eq!(registry.latest().map(|r| r.pm2_5_env), Some(8));
//! ```

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

mod capture;
mod exposition;
mod metrics;
pub mod protocols;
mod source;
pub mod stream;

pub use capture::{CaptureError, decode_capture_file, decode_capture_into, decode_source};
pub use exposition::render_prometheus;
pub use metrics::{Counter, HealthCounters, MetricsRegistry};
pub use protocols::pms5003::SensorRecord;
pub use source::{ByteSource, DeviceSource, ReaderSource, SourceError};
pub use stream::{DecodeError, RecordSink, SessionSummary, run_session};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no wall-clock time applies (offline decodes).
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Stream health and latest reading for one input.
///
/// # Examples
/// ```
/// use pmsense_core::make_stub_report;
///
/// let report = make_stub_report("capture.bin", Some(64));
/// assert_eq!(report.report_version, pmsense_core::REPORT_VERSION);
/// assert!(report.latest_reading.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input stream metadata.
    pub input: InputInfo,

    /// Health counters at the time the report was built.
    pub health: HealthSummary,
    /// Most recent validated reading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_reading: Option<SensorRecord>,
    /// Stream error that ended the session, when it did not end cleanly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_reason: Option<String>,
}

/// Tool metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "pmsense").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input metadata embedded in reports.
///
/// # Examples
/// ```
/// use pmsense_core::InputInfo;
///
/// let input = InputInfo {
///     path: "/dev/ttyUSB0".to_string(),
///     bytes: None,
/// };
/// assert!(input.bytes.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the decoder.
    pub path: String,
    /// Input size in bytes, known for capture files only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Point-in-time copy of the health counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Frames read in full after a magic sequence.
    pub packets_received: u64,
    /// Frames validated and forwarded.
    pub packets_forwarded: u64,
    /// Frames dropped on checksum mismatch.
    pub checksum_errors: u64,
    /// Frames dropped on a declared length other than 28.
    pub framing_errors: u64,
    /// Streams that ended inside a frame.
    pub short_reads: u64,
    /// Bytes discarded while searching for the magic sequence.
    pub bytes_skipped: u64,
}

impl HealthSummary {
    /// Frames found after a magic sequence but not forwarded.
    pub fn dropped(&self) -> u64 {
        self.checksum_errors + self.framing_errors + self.short_reads
    }
}

/// Build a stub report with base fields filled and empty health.
///
/// # Examples
/// ```
/// use pmsense_core::make_stub_report;
///
/// let report = make_stub_report("capture.bin", None);
/// assert_eq!(report.health.packets_forwarded, 0);
/// assert_eq!(report.generated_at, pmsense_core::DEFAULT_GENERATED_AT);
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: Option<u64>) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "pmsense".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        health: HealthSummary::default(),
        latest_reading: None,
        end_reason: None,
    }
}

/// Build a report from the current state of `registry`.
pub fn make_report(
    input_path: &str,
    input_bytes: Option<u64>,
    registry: &MetricsRegistry,
) -> Report {
    let mut report = make_stub_report(input_path, input_bytes);
    report.health = registry.snapshot();
    report.latest_reading = registry.latest();
    report
}

/// Current UTC time as RFC3339, falling back to the default timestamp.
pub fn timestamp_now() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| DEFAULT_GENERATED_AT.to_string())
}
