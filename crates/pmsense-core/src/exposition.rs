//! Prometheus text exposition of a `MetricsRegistry`.
//!
//! Size labels use decimal microns throughout: mass concentrations are
//! labelled `microns="1"|"2.5"|"10"`, particle counts
//! `microns_lower_bound="0.3"|"0.5"|"1"|"2.5"|"5"|"10"`. Gauges are only
//! written once a valid reading exists, and keep the last-known-good values
//! after the stream fails.

use std::fmt::Write;

use crate::metrics::MetricsRegistry;

/// Render counters and latest-reading gauges in the Prometheus text format.
///
/// # Examples
/// ```
/// use pmsense_core::{MetricsRegistry, render_prometheus};
///
/// let registry = MetricsRegistry::new();
/// let text = render_prometheus(&registry);
/// assert!(text.contains("pms_skipped_bytes 0"));
/// assert!(!text.contains("pms_particle_counts"));
/// ```
pub fn render_prometheus(registry: &MetricsRegistry) -> String {
    let mut out = String::new();
    let health = registry.snapshot();

    write_counter(
        &mut out,
        "pms_received_packets",
        "Frames validated and forwarded",
        health.packets_forwarded,
    );
    write_counter(
        &mut out,
        "pms_packet_checksum_errors",
        "Frames dropped on checksum mismatch",
        health.checksum_errors,
    );
    write_counter(
        &mut out,
        "pms_packet_length_errors",
        "Frames dropped on unexpected declared length",
        health.framing_errors,
    );
    write_counter(
        &mut out,
        "pms_short_reads",
        "Streams that ended inside a frame",
        health.short_reads,
    );
    write_counter(
        &mut out,
        "pms_skipped_bytes",
        "Bytes discarded while searching for the start of a frame",
        health.bytes_skipped,
    );

    if let Some(record) = registry.latest() {
        write_gauge(
            &mut out,
            "pms_particulate_matter_standard",
            "Micrograms per cubic meter, standard particle",
            "microns",
            &[
                ("1", record.pm1_standard),
                ("2.5", record.pm2_5_standard),
                ("10", record.pm10_standard),
            ],
        );
        write_gauge(
            &mut out,
            "pms_particulate_matter_environmental",
            "Micrograms per cubic meter, adjusted for atmospheric environment",
            "microns",
            &[
                ("1", record.pm1_env),
                ("2.5", record.pm2_5_env),
                ("10", record.pm10_env),
            ],
        );
        write_gauge(
            &mut out,
            "pms_particle_counts",
            "Number of particles with diameter beyond given number of microns in 0.1L of air",
            "microns_lower_bound",
            &[
                ("0.3", record.count_0_3um),
                ("0.5", record.count_0_5um),
                ("1", record.count_1_0um),
                ("2.5", record.count_2_5um),
                ("5", record.count_5um),
                ("10", record.count_10um),
            ],
        );
    }

    out
}

fn write_counter(out: &mut String, name: &str, help: &str, value: u64) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} counter");
    let _ = writeln!(out, "{name} {value}");
}

fn write_gauge(out: &mut String, name: &str, help: &str, label: &str, series: &[(&str, u16)]) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} gauge");
    for (label_value, value) in series {
        let _ = writeln!(out, "{name}{{{label}=\"{label_value}\"}} {value}");
    }
}
