use super::layout;
use super::parser::SensorRecord;
use crate::protocols::common::checksum::wrapping_sum_u16;

/// Encode a record as it appears on the wire, magic sequence included.
///
/// The checksum is always recomputed from the fields; `record.checksum` is
/// ignored.
///
/// # Examples
/// ```
/// use pmsense_core::protocols::pms5003::{SensorRecord, encode_frame, parse_frame};
///
/// let record = SensorRecord { frame_length: 28, pm2_5_env: 12, ..Default::default() };
/// let wire = encode_frame(&record);
/// let decoded = parse_frame(&wire[2..]).unwrap();
/// assert_eq!(decoded.pm2_5_env, 12);
/// ```
pub fn encode_frame(record: &SensorRecord) -> [u8; layout::MAGIC.len() + layout::FRAME_LEN] {
    let mut wire = [0u8; layout::MAGIC.len() + layout::FRAME_LEN];
    wire[..layout::MAGIC.len()].copy_from_slice(&layout::MAGIC);

    let body = encode_body(record);
    wire[layout::MAGIC.len()..].copy_from_slice(&body);
    wire
}

/// Encode the 30 bytes that follow the magic sequence.
pub fn encode_body(record: &SensorRecord) -> [u8; layout::FRAME_LEN] {
    let mut frame = [0u8; layout::FRAME_LEN];
    let fields = [
        (layout::FRAME_LENGTH_RANGE, record.frame_length),
        (layout::PM1_STANDARD_RANGE, record.pm1_standard),
        (layout::PM2_5_STANDARD_RANGE, record.pm2_5_standard),
        (layout::PM10_STANDARD_RANGE, record.pm10_standard),
        (layout::PM1_ENV_RANGE, record.pm1_env),
        (layout::PM2_5_ENV_RANGE, record.pm2_5_env),
        (layout::PM10_ENV_RANGE, record.pm10_env),
        (layout::COUNT_0_3UM_RANGE, record.count_0_3um),
        (layout::COUNT_0_5UM_RANGE, record.count_0_5um),
        (layout::COUNT_1_0UM_RANGE, record.count_1_0um),
        (layout::COUNT_2_5UM_RANGE, record.count_2_5um),
        (layout::COUNT_5UM_RANGE, record.count_5um),
        (layout::COUNT_10UM_RANGE, record.count_10um),
        (layout::RESERVED_RANGE, record.reserved),
    ];
    for (range, value) in fields {
        frame[range].copy_from_slice(&value.to_be_bytes());
    }

    let checksum = wrapping_sum_u16(layout::CHECKSUM_SEED, &frame[layout::PAYLOAD_RANGE]);
    frame[layout::CHECKSUM_RANGE].copy_from_slice(&checksum.to_be_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::{encode_body, encode_frame};
    use crate::protocols::pms5003::error::Pms5003Error;
    use crate::protocols::pms5003::layout;
    use crate::protocols::pms5003::parser::{SensorRecord, parse_frame};
    use proptest::prelude::*;

    prop_compose! {
        fn arb_valid_record()(
            masses in prop::array::uniform6(any::<u16>()),
            counts in prop::array::uniform6(any::<u16>()),
            reserved in any::<u16>(),
        ) -> SensorRecord {
            SensorRecord {
                frame_length: layout::EXPECTED_FRAME_LENGTH,
                pm1_standard: masses[0],
                pm2_5_standard: masses[1],
                pm10_standard: masses[2],
                pm1_env: masses[3],
                pm2_5_env: masses[4],
                pm10_env: masses[5],
                count_0_3um: counts[0],
                count_0_5um: counts[1],
                count_1_0um: counts[2],
                count_2_5um: counts[3],
                count_5um: counts[4],
                count_10um: counts[5],
                reserved,
                checksum: 0,
            }
        }
    }

    #[test]
    fn encode_frame_starts_with_magic() {
        let wire = encode_frame(&SensorRecord::default());
        assert_eq!(&wire[..2], &layout::MAGIC);
        assert_eq!(wire.len(), 32);
    }

    #[test]
    fn encode_sample_checksum() {
        let record = SensorRecord {
            frame_length: 28,
            pm1_standard: 4,
            pm2_5_standard: 6,
            pm10_standard: 6,
            pm1_env: 4,
            pm2_5_env: 6,
            pm10_env: 6,
            count_0_3um: 954,
            count_0_5um: 254,
            count_1_0um: 34,
            ..Default::default()
        };
        let body = encode_body(&record);
        assert_eq!(&body[layout::CHECKSUM_RANGE], &[0x02, 0xA8]);
    }

    proptest! {
        #[test]
        fn prop_encode_then_parse_preserves_fields(record in arb_valid_record()) {
            let body = encode_body(&record);
            let decoded = parse_frame(&body).unwrap();
            let expected_checksum = u16::from_be_bytes([body[28], body[29]]);
            prop_assert_eq!(decoded, SensorRecord { checksum: expected_checksum, ..record });
        }

        #[test]
        fn prop_single_bit_flip_is_checksum_mismatch(
            record in arb_valid_record(),
            byte in 0..layout::PAYLOAD_LEN,
            bit in 0..8u8,
        ) {
            let mut body = encode_body(&record);
            body[byte] ^= 1 << bit;
            let err = parse_frame(&body).unwrap_err();
            let is_checksum_mismatch = matches!(err, Pms5003Error::ChecksumMismatch { .. });
            prop_assert!(is_checksum_mismatch);
        }
    }
}
