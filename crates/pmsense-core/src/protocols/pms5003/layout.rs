pub const MAGIC: [u8; 2] = [0x42, 0x4D];

/// Bytes following the magic sequence: payload plus checksum.
pub const FRAME_LEN: usize = 30;
/// Bytes covered by the checksum after the magic sequence.
pub const PAYLOAD_LEN: usize = 28;
/// Value the sensor reports in `frame_length` for a conforming frame.
pub const EXPECTED_FRAME_LENGTH: u16 = PAYLOAD_LEN as u16;

pub const PAYLOAD_RANGE: std::ops::Range<usize> = 0..PAYLOAD_LEN;

pub const FRAME_LENGTH_RANGE: std::ops::Range<usize> = 0..2;

pub const PM1_STANDARD_RANGE: std::ops::Range<usize> = 2..4;
pub const PM2_5_STANDARD_RANGE: std::ops::Range<usize> = 4..6;
pub const PM10_STANDARD_RANGE: std::ops::Range<usize> = 6..8;

pub const PM1_ENV_RANGE: std::ops::Range<usize> = 8..10;
pub const PM2_5_ENV_RANGE: std::ops::Range<usize> = 10..12;
pub const PM10_ENV_RANGE: std::ops::Range<usize> = 12..14;

pub const COUNT_0_3UM_RANGE: std::ops::Range<usize> = 14..16;
pub const COUNT_0_5UM_RANGE: std::ops::Range<usize> = 16..18;
pub const COUNT_1_0UM_RANGE: std::ops::Range<usize> = 18..20;
pub const COUNT_2_5UM_RANGE: std::ops::Range<usize> = 20..22;
pub const COUNT_5UM_RANGE: std::ops::Range<usize> = 22..24;
pub const COUNT_10UM_RANGE: std::ops::Range<usize> = 24..26;

pub const RESERVED_RANGE: std::ops::Range<usize> = 26..28;
pub const CHECKSUM_RANGE: std::ops::Range<usize> = 28..30;

/// Checksum seed: the magic bytes are summed but not part of the frame buffer.
pub const CHECKSUM_SEED: u16 = MAGIC[0] as u16 + MAGIC[1] as u16;
