use std::path::Path;

use thiserror::Error;
use tracing::info;

use crate::metrics::MetricsRegistry;
use crate::protocols::pms5003::SensorRecord;
use crate::source::{ByteSource, DeviceSource, SourceError};
use crate::stream::run_session;
use crate::{Report, make_report};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

/// Decode every frame of a recorded byte stream into a report.
pub fn decode_capture_file(path: &Path) -> Result<Report, CaptureError> {
    let registry = MetricsRegistry::new();
    decode_capture_into(path, &registry)
}

/// Like `decode_capture_file`, accumulating into an existing registry.
pub fn decode_capture_into(path: &Path, registry: &MetricsRegistry) -> Result<Report, CaptureError> {
    let source = DeviceSource::open(path)?;
    let bytes = path.metadata()?.len();
    decode_source(&path.display().to_string(), Some(bytes), source, registry)
}

/// Run a session over `source` until it is exhausted.
///
/// End of stream is the normal end of a capture; any other source error is
/// returned.
pub fn decode_source<S: ByteSource>(
    input_path: &str,
    input_bytes: Option<u64>,
    mut source: S,
    registry: &MetricsRegistry,
) -> Result<Report, CaptureError> {
    let mut sink = |_: &SensorRecord| {};
    match run_session(&mut source, registry, &mut sink, None) {
        Ok(_) | Err(SourceError::EndOfStream) => {}
        Err(err) => return Err(err.into()),
    }

    let report = make_report(input_path, input_bytes, registry);
    info!(
        forwarded = report.health.packets_forwarded,
        dropped = report.health.dropped(),
        "capture decoded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::decode_source;
    use crate::metrics::MetricsRegistry;
    use crate::protocols::pms5003::{SensorRecord, encode_frame};
    use crate::source::ReaderSource;

    #[test]
    fn decode_source_reports_counters_and_latest() {
        let first = SensorRecord {
            frame_length: 28,
            pm10_standard: 21,
            ..Default::default()
        };
        let mut bytes = vec![0xFF; 5];
        bytes.extend_from_slice(&encode_frame(&first));
        let mut corrupted = encode_frame(&first);
        corrupted[31] ^= 0xFF;
        bytes.extend_from_slice(&corrupted);

        let registry = MetricsRegistry::new();
        let report = decode_source(
            "capture.bin",
            Some(bytes.len() as u64),
            ReaderSource::new(Cursor::new(bytes)),
            &registry,
        )
        .unwrap();

        assert_eq!(report.health.bytes_skipped, 5);
        assert_eq!(report.health.packets_forwarded, 1);
        assert_eq!(report.health.checksum_errors, 1);
        assert_eq!(report.latest_reading.map(|r| r.pm10_standard), Some(21));
        assert_eq!(report.input.bytes, Some(69));
        assert!(report.end_reason.is_none());
    }
}
