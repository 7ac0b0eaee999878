use std::fs;
use std::path::{Path, PathBuf};

use pmsense_core::decode_capture_file;
use pmsense_core::protocols::pms5003::{SensorRecord, encode_frame, layout};

/// Writes each golden case's `input.bin`, then decodes it into the
/// `expected_report.json` next to it. Run from the workspace root.
fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    for (case, bytes) in [("clean", clean_capture()), ("noisy", noisy_capture())] {
        let dir = root.join(case);
        let input = dir.join("input.bin");
        write_capture(&input, &bytes)?;
        write_expected_report(&input, &dir.join("expected_report.json"))?;
    }
    Ok(())
}

fn reading(pm2_5: u16, count_0_3um: u16) -> SensorRecord {
    SensorRecord {
        frame_length: layout::EXPECTED_FRAME_LENGTH,
        pm1_standard: pm2_5 / 2,
        pm2_5_standard: pm2_5,
        pm10_standard: pm2_5 + 2,
        pm1_env: pm2_5 / 2,
        pm2_5_env: pm2_5,
        pm10_env: pm2_5 + 2,
        count_0_3um,
        count_0_5um: count_0_3um / 4,
        count_1_0um: count_0_3um / 28,
        count_2_5um: 1,
        count_5um: 0,
        count_10um: 0,
        reserved: 0x9700,
        checksum: 0,
    }
}

/// Three back-to-back frames, aligned from the first byte.
fn clean_capture() -> Vec<u8> {
    let mut bytes = Vec::new();
    for (pm2_5, count) in [(4, 954), (6, 1020), (5, 988)] {
        bytes.extend_from_slice(&encode_frame(&reading(pm2_5, count)));
    }
    bytes
}

/// A stream joined mid-frame, with one instance of every recoverable fault.
fn noisy_capture() -> Vec<u8> {
    let mut bytes = Vec::new();

    // Tail of a previous frame: 7 bytes of noise.
    bytes.extend_from_slice(&[0x00, 0x22, 0x00, 0x00, 0x97, 0x00, 0x03]);
    bytes.extend_from_slice(&encode_frame(&reading(12, 2100)));

    // Payload bit flip.
    let mut corrupted = encode_frame(&reading(13, 2200));
    corrupted[layout::MAGIC.len() + layout::PM2_5_ENV_RANGE.start] ^= 0x08;
    bytes.extend_from_slice(&corrupted);

    // Duplicated first magic byte.
    bytes.push(layout::MAGIC[0]);
    bytes.extend_from_slice(&encode_frame(&reading(14, 2300)));

    // Good checksum, wrong declared length.
    bytes.extend_from_slice(&encode_frame(&SensorRecord {
        frame_length: 20,
        ..reading(15, 2400)
    }));

    bytes.extend_from_slice(&encode_frame(&reading(16, 2500)));

    // Stream cut inside the last frame.
    let truncated = encode_frame(&reading(17, 2600));
    bytes.extend_from_slice(&truncated[..layout::MAGIC.len() + layout::FRAME_LEN - 1]);
    bytes
}

fn write_capture(path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(path, bytes).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

fn write_expected_report(input: &Path, output: &Path) -> Result<(), String> {
    let report = decode_capture_file(input)
        .map_err(|err| format!("decode failed for {}: {}", input.display(), err))?;
    let dropped = report.health.dropped();
    let json = serde_json::to_string_pretty(&report)
        .map_err(|err| format!("JSON serialization failed: {}", err))?;
    fs::write(output, json).map_err(|err| format!("failed to write {}: {}", output.display(), err))?;
    println!(
        "{}: {} forwarded, {} dropped",
        input.display(),
        report.health.packets_forwarded,
        dropped
    );
    Ok(())
}
