use serde::{Deserialize, Serialize};

use super::error::Pms5003Error;
use super::layout;
use super::reader::Pms5003Reader;

/// One decoded PMS5003 frame.
///
/// Mass concentrations are in micrograms per cubic meter; particle counts are
/// per 0.1 L of air, for particles beyond the given diameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Declared payload length as sent by the sensor.
    pub frame_length: u16,
    pub pm1_standard: u16,
    pub pm2_5_standard: u16,
    pub pm10_standard: u16,
    pub pm1_env: u16,
    pub pm2_5_env: u16,
    pub pm10_env: u16,
    pub count_0_3um: u16,
    pub count_0_5um: u16,
    pub count_1_0um: u16,
    pub count_2_5um: u16,
    pub count_5um: u16,
    pub count_10um: u16,
    /// Carried through, not interpreted.
    pub reserved: u16,
    /// Checksum as read from the wire.
    pub checksum: u16,
}

impl SensorRecord {
    /// Whether the declared length matches a conforming frame.
    pub fn is_valid(&self) -> bool {
        self.frame_length == layout::EXPECTED_FRAME_LENGTH
    }
}

/// Decode the 30 bytes following the magic sequence.
///
/// Fails with `ChecksumMismatch` before looking at the declared length, so a
/// corrupted length field is reported as corruption rather than as a
/// non-conforming frame.
pub fn parse_frame(frame: &[u8]) -> Result<SensorRecord, Pms5003Error> {
    let record = read_record(frame)?;

    let computed = Pms5003Reader::new(frame).computed_checksum()?;
    if computed != record.checksum {
        return Err(Pms5003Error::ChecksumMismatch {
            computed,
            wire: record.checksum,
        });
    }

    if !record.is_valid() {
        return Err(Pms5003Error::InvalidFrameLength {
            length: record.frame_length,
        });
    }

    Ok(record)
}

/// Decode the fields of a frame without validating it.
pub fn read_record(frame: &[u8]) -> Result<SensorRecord, Pms5003Error> {
    let reader = Pms5003Reader::new(frame);
    reader.require_len(layout::FRAME_LEN)?;

    Ok(SensorRecord {
        frame_length: reader.read_u16_be(layout::FRAME_LENGTH_RANGE.clone())?,
        pm1_standard: reader.read_u16_be(layout::PM1_STANDARD_RANGE.clone())?,
        pm2_5_standard: reader.read_u16_be(layout::PM2_5_STANDARD_RANGE.clone())?,
        pm10_standard: reader.read_u16_be(layout::PM10_STANDARD_RANGE.clone())?,
        pm1_env: reader.read_u16_be(layout::PM1_ENV_RANGE.clone())?,
        pm2_5_env: reader.read_u16_be(layout::PM2_5_ENV_RANGE.clone())?,
        pm10_env: reader.read_u16_be(layout::PM10_ENV_RANGE.clone())?,
        count_0_3um: reader.read_u16_be(layout::COUNT_0_3UM_RANGE.clone())?,
        count_0_5um: reader.read_u16_be(layout::COUNT_0_5UM_RANGE.clone())?,
        count_1_0um: reader.read_u16_be(layout::COUNT_1_0UM_RANGE.clone())?,
        count_2_5um: reader.read_u16_be(layout::COUNT_2_5UM_RANGE.clone())?,
        count_5um: reader.read_u16_be(layout::COUNT_5UM_RANGE.clone())?,
        count_10um: reader.read_u16_be(layout::COUNT_10UM_RANGE.clone())?,
        reserved: reader.read_u16_be(layout::RESERVED_RANGE.clone())?,
        checksum: reader.wire_checksum()?,
    })
}
