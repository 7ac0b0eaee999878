//! Stream health counters and the latest-reading gauges.
//!
//! A `MetricsRegistry` is created once per process and shared by reference
//! (or `Arc`) between the decode loop and whatever exports it. Counters are
//! independent atomics; the latest reading sits behind a lock so an exporter
//! never observes a half-updated record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::HealthSummary;
use crate::protocols::pms5003::SensorRecord;

/// A monotonically increasing event count.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct HealthCounters {
    /// Frames read in full after a magic sequence.
    pub packets_received: Counter,
    /// Frames that passed validation and reached the sink.
    pub packets_forwarded: Counter,
    pub checksum_errors: Counter,
    /// Frames with a good checksum but a declared length other than 28.
    pub framing_errors: Counter,
    /// Streams that ended part way through a frame.
    pub short_reads: Counter,
    /// Bytes discarded while searching for the magic sequence.
    pub bytes_skipped: Counter,
}

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    health: HealthCounters,
    latest: RwLock<Option<SensorRecord>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self) -> &HealthCounters {
        &self.health
    }

    /// Publish a validated reading as the latest gauge values.
    pub fn set_latest(&self, record: &SensorRecord) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some(*record);
    }

    /// The most recent validated reading, if any.
    pub fn latest(&self) -> Option<SensorRecord> {
        *self.latest.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> HealthSummary {
        HealthSummary {
            packets_received: self.health.packets_received.get(),
            packets_forwarded: self.health.packets_forwarded.get(),
            checksum_errors: self.health.checksum_errors.get(),
            framing_errors: self.health.framing_errors.get(),
            short_reads: self.health.short_reads.get(),
            bytes_skipped: self.health.bytes_skipped.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::MetricsRegistry;
    use crate::protocols::pms5003::SensorRecord;

    #[test]
    fn snapshot_reflects_counters() {
        let registry = MetricsRegistry::new();
        registry.health().checksum_errors.inc();
        registry.health().bytes_skipped.inc();
        registry.health().bytes_skipped.inc();

        let summary = registry.snapshot();
        assert_eq!(summary.checksum_errors, 1);
        assert_eq!(summary.bytes_skipped, 2);
        assert_eq!(summary.packets_forwarded, 0);
    }

    #[test]
    fn latest_is_none_until_set() {
        let registry = MetricsRegistry::new();
        assert!(registry.latest().is_none());

        let record = SensorRecord {
            frame_length: 28,
            pm2_5_env: 7,
            ..Default::default()
        };
        registry.set_latest(&record);
        assert_eq!(registry.latest(), Some(record));
    }

    #[test]
    fn counters_are_shared_across_threads() {
        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.health().packets_received.inc();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.snapshot().packets_received, 4000);
    }
}
