use tracing::warn;

use super::DecodeError;
use crate::metrics::MetricsRegistry;
use crate::protocols::pms5003::{Pms5003Error, SensorRecord, layout, parse_frame};
use crate::source::ByteSource;

/// Read and validate the frame following a magic sequence.
///
/// Call right after `find_next_frame` succeeded. Updates the health counters
/// for every outcome except a source failure; nothing is retried here.
pub fn decode_frame<S: ByteSource + ?Sized>(
    source: &mut S,
    metrics: &MetricsRegistry,
) -> Result<SensorRecord, DecodeError> {
    let health = metrics.health();
    let mut frame = [0u8; layout::FRAME_LEN];
    let read = source.read_frame(&mut frame)?;
    if read < layout::FRAME_LEN {
        health.short_reads.inc();
        warn!(read, "stream ended inside a frame");
        return Err(DecodeError::ShortRead {
            needed: layout::FRAME_LEN,
            actual: read,
        });
    }
    health.packets_received.inc();

    match parse_frame(&frame) {
        Ok(record) => {
            health.packets_forwarded.inc();
            Ok(record)
        }
        Err(Pms5003Error::ChecksumMismatch { computed, wire }) => {
            health.checksum_errors.inc();
            warn!(computed, wire, "checksum mismatch, dropping frame");
            Err(DecodeError::Checksum { computed, wire })
        }
        Err(Pms5003Error::InvalidFrameLength { length }) => {
            health.framing_errors.inc();
            warn!(length, "unexpected frame length, dropping frame");
            Err(DecodeError::FrameLength { length })
        }
        Err(Pms5003Error::TooShort { needed, actual }) => {
            Err(DecodeError::ShortRead { needed, actual })
        }
    }
}
