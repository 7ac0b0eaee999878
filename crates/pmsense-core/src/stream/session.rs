use tracing::{debug, info, warn};

use super::{DecodeError, decode_frame, find_next_frame};
use crate::metrics::MetricsRegistry;
use crate::protocols::pms5003::SensorRecord;
use crate::source::{ByteSource, SourceError};

/// Receives every validated record, in stream order, after it has been
/// published to the registry's latest-reading gauges.
pub trait RecordSink {
    fn accept(&mut self, record: &SensorRecord);
}

impl<F: FnMut(&SensorRecord)> RecordSink for F {
    fn accept(&mut self, record: &SensorRecord) {
        self(record)
    }
}

/// Outcome of a session that stopped because its reading limit was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub forwarded: u64,
    pub dropped: u64,
}

/// Scan, decode and forward frames until `limit` readings were forwarded.
///
/// Recoverable frame errors are logged and the scan restarts at the next
/// byte. The first `SourceError` ends the session and is returned as is; the
/// caller owns the decision to reopen the source or exit. With `limit` set to
/// `None` the session only ever ends that way.
pub fn run_session<S, K>(
    source: &mut S,
    metrics: &MetricsRegistry,
    sink: &mut K,
    limit: Option<u64>,
) -> Result<SessionSummary, SourceError>
where
    S: ByteSource + ?Sized,
    K: RecordSink + ?Sized,
{
    let mut summary = SessionSummary {
        forwarded: 0,
        dropped: 0,
    };
    if limit == Some(0) {
        return Ok(summary);
    }

    loop {
        debug!("awaiting magic sequence");
        find_next_frame(source, metrics)?;
        match decode_frame(source, metrics) {
            Ok(record) => {
                info!(
                    pm1 = record.pm1_env,
                    pm2_5 = record.pm2_5_env,
                    pm10 = record.pm10_env,
                    "reading"
                );
                metrics.set_latest(&record);
                sink.accept(&record);
                summary.forwarded += 1;
                if limit.is_some_and(|limit| summary.forwarded >= limit) {
                    return Ok(summary);
                }
            }
            Err(DecodeError::Source(err)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "dropping frame");
                summary.dropped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::run_session;
    use crate::HealthSummary;
    use crate::metrics::MetricsRegistry;
    use crate::protocols::pms5003::{SensorRecord, encode_frame};
    use crate::source::{ByteSource, ReaderSource, SourceError};

    fn reading(pm2_5: u16) -> SensorRecord {
        SensorRecord {
            frame_length: 28,
            pm2_5_standard: pm2_5,
            pm2_5_env: pm2_5,
            ..Default::default()
        }
    }

    fn source(bytes: Vec<u8>) -> ReaderSource<Cursor<Vec<u8>>> {
        ReaderSource::new(Cursor::new(bytes))
    }

    #[test]
    fn forwards_until_end_of_stream() {
        let mut bytes = vec![0x00, 0x13, 0x37];
        bytes.extend_from_slice(&encode_frame(&reading(5)));
        bytes.extend_from_slice(&encode_frame(&reading(9)));
        let metrics = MetricsRegistry::new();
        let mut seen = Vec::new();
        let mut sink = |record: &SensorRecord| seen.push(record.pm2_5_env);

        let err = run_session(&mut source(bytes), &metrics, &mut sink, None).unwrap_err();
        assert!(matches!(err, SourceError::EndOfStream));
        assert_eq!(seen, vec![5, 9]);

        let summary = metrics.snapshot();
        assert_eq!(summary.packets_forwarded, 2);
        assert_eq!(summary.bytes_skipped, 3);
        assert_eq!(metrics.latest().map(|r| r.pm2_5_env), Some(9));
    }

    #[test]
    fn corrupted_frame_is_dropped_and_next_one_decoded() {
        let mut corrupted = encode_frame(&reading(5));
        corrupted[10] ^= 0x01;
        let mut bytes = corrupted.to_vec();
        bytes.extend_from_slice(&encode_frame(&reading(9)));
        let metrics = MetricsRegistry::new();
        let mut sink = |_: &SensorRecord| {};

        let summary = run_session(&mut source(bytes), &metrics, &mut sink, Some(1)).unwrap();
        assert_eq!(summary.forwarded, 1);
        assert_eq!(summary.dropped, 1);
        assert_eq!(metrics.snapshot().checksum_errors, 1);
        assert_eq!(metrics.latest().map(|r| r.pm2_5_env), Some(9));
    }

    #[test]
    fn zero_limit_reads_nothing() {
        let metrics = MetricsRegistry::new();
        let mut src = source(encode_frame(&reading(1)).to_vec());
        let mut seen = 0;
        let mut sink = |_: &SensorRecord| seen += 1;

        let summary = run_session(&mut src, &metrics, &mut sink, Some(0)).unwrap();
        assert_eq!(seen, 0);
        assert_eq!(summary.forwarded, 0);
        assert_eq!(summary.dropped, 0);
        assert_eq!(src.read_byte().unwrap(), 0x42);
        assert_eq!(metrics.snapshot(), HealthSummary::default());
    }

    #[test]
    fn limit_stops_before_reading_further() {
        let mut bytes = encode_frame(&reading(1)).to_vec();
        bytes.extend_from_slice(&encode_frame(&reading(2)));
        let metrics = MetricsRegistry::new();
        let mut src = source(bytes);
        let mut sink = |_: &SensorRecord| {};

        let summary = run_session(&mut src, &metrics, &mut sink, Some(1)).unwrap();
        assert_eq!(summary.forwarded, 1);
        assert_eq!(metrics.snapshot().packets_received, 1);
    }

    #[test]
    fn last_known_good_survives_a_fatal_error() {
        let mut bytes = encode_frame(&reading(3)).to_vec();
        let mut bad = encode_frame(&SensorRecord {
            frame_length: 40,
            ..reading(99)
        })
        .to_vec();
        bad.truncate(20);
        bytes.extend_from_slice(&bad);
        let metrics = MetricsRegistry::new();
        let mut sink = |_: &SensorRecord| {};

        let err = run_session(&mut source(bytes), &metrics, &mut sink, None).unwrap_err();
        assert!(matches!(err, SourceError::EndOfStream));
        assert_eq!(metrics.latest().map(|r| r.pm2_5_env), Some(3));
        assert_eq!(metrics.snapshot().short_reads, 1);
    }
}
