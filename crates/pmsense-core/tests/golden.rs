use std::fs;
use std::path::Path;

use pmsense_core::{Report, decode_capture_file};

fn load_expected_report(dir: &str) -> Report {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let expected_path = root.join(dir).join("expected_report.json");

    let expected_json = fs::read_to_string(&expected_path).expect("read expected_report.json");
    serde_json::from_str(&expected_json).expect("parse expected report")
}

fn run_golden(dir: &str) -> Report {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    let input = root.join(dir).join("input.bin");
    let expected = load_expected_report(dir);

    let mut actual = decode_capture_file(&input).expect("decode capture");
    actual.generated_at = expected.generated_at.clone();
    actual.input.path = expected.input.path.clone();
    actual.tool.version = expected.tool.version.clone();

    let actual_value = serde_json::to_value(&actual).expect("serialize actual");
    let expected_value = serde_json::to_value(expected).expect("serialize expected");

    assert_eq!(actual_value, expected_value, "golden mismatch in {dir}");
    actual
}

#[test]
fn golden_clean() {
    run_golden("tests/golden/clean");
}

#[test]
fn golden_noisy() {
    run_golden("tests/golden/noisy");
}

#[test]
fn golden_clean_has_no_dropped_frames() {
    let report = run_golden("tests/golden/clean");
    assert_eq!(report.health.dropped(), 0);
    assert_eq!(report.health.bytes_skipped, 0);
    assert_eq!(report.health.packets_forwarded, 3);
}

#[test]
fn golden_noisy_counts_each_fault_once() {
    let report = run_golden("tests/golden/noisy");
    assert_eq!(report.health.checksum_errors, 1);
    assert_eq!(report.health.framing_errors, 1);
    assert_eq!(report.health.short_reads, 1);
    assert_eq!(report.health.bytes_skipped, 8);
    let latest = report.latest_reading.expect("latest reading");
    assert_eq!(latest.pm2_5_env, 16);
    assert!(latest.is_valid());
}
