use tracing::{debug, trace};

use crate::metrics::MetricsRegistry;
use crate::protocols::pms5003::layout;
use crate::source::{ByteSource, SourceError};

/// Advance `source` until it sits just past the next magic sequence.
///
/// Returns how many bytes were discarded on the way. Each discarded byte is
/// also counted in `bytes_skipped` as soon as it is dropped, so the counter
/// stays exact when the source fails mid-scan. The window moves one byte per
/// read and never backtracks: in `42 42 4D` the first `42` is skipped and the
/// second one starts the frame.
pub fn find_next_frame<S: ByteSource + ?Sized>(
    source: &mut S,
    metrics: &MetricsRegistry,
) -> Result<u64, SourceError> {
    let mut skipped = 0u64;
    let mut current = source.read_byte()?;
    loop {
        let previous = current;
        current = source.read_byte()?;
        if [previous, current] == layout::MAGIC {
            debug!(skipped, "found magic sequence");
            return Ok(skipped);
        }
        trace!(byte = previous, "skipping byte");
        skipped += 1;
        metrics.health().bytes_skipped.inc();
    }
}
