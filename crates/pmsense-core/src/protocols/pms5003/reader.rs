use super::error::Pms5003Error;
use super::layout;
use crate::protocols::common::checksum::wrapping_sum_u16;

pub struct Pms5003Reader<'a> {
    frame: &'a [u8],
}

impl<'a> Pms5003Reader<'a> {
    pub fn new(frame: &'a [u8]) -> Self {
        Self { frame }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), Pms5003Error> {
        if self.frame.len() < needed {
            return Err(Pms5003Error::TooShort {
                needed,
                actual: self.frame.len(),
            });
        }
        Ok(())
    }

    pub fn read_u16_be(&self, range: std::ops::Range<usize>) -> Result<u16, Pms5003Error> {
        let bytes = self.read_slice(range)?;
        if bytes.len() != 2 {
            return Err(Pms5003Error::TooShort {
                needed: 2,
                actual: bytes.len(),
            });
        }
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Result<&'a [u8], Pms5003Error> {
        self.frame.get(range.clone()).ok_or(Pms5003Error::TooShort {
            needed: range.end,
            actual: self.frame.len(),
        })
    }

    /// Sum of the magic bytes and the payload, as the sensor computes it.
    pub fn computed_checksum(&self) -> Result<u16, Pms5003Error> {
        let payload = self.read_slice(layout::PAYLOAD_RANGE.clone())?;
        Ok(wrapping_sum_u16(layout::CHECKSUM_SEED, payload))
    }

    pub fn wire_checksum(&self) -> Result<u16, Pms5003Error> {
        self.read_u16_be(layout::CHECKSUM_RANGE.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::Pms5003Reader;
    use crate::protocols::pms5003::error::Pms5003Error;
    use crate::protocols::pms5003::layout;

    #[test]
    fn read_u16_is_big_endian() {
        let frame = [0x03, 0xBA, 0x00];
        let reader = Pms5003Reader::new(&frame);
        assert_eq!(reader.read_u16_be(0..2).unwrap(), 954);
    }

    #[test]
    fn read_past_end_is_too_short() {
        let frame = [0u8; 3];
        let reader = Pms5003Reader::new(&frame);
        let err = reader.read_u16_be(2..4).unwrap_err();
        assert_eq!(
            err,
            Pms5003Error::TooShort {
                needed: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn computed_checksum_of_zero_payload_is_magic_sum() {
        let frame = [0u8; layout::FRAME_LEN];
        let reader = Pms5003Reader::new(&frame);
        assert_eq!(reader.computed_checksum().unwrap(), 0x42 + 0x4D);
    }

    #[test]
    fn computed_checksum_ignores_wire_checksum_bytes() {
        let mut frame = [0u8; layout::FRAME_LEN];
        frame[layout::CHECKSUM_RANGE.clone()].copy_from_slice(&[0xff, 0xff]);
        let reader = Pms5003Reader::new(&frame);
        assert_eq!(reader.computed_checksum().unwrap(), layout::CHECKSUM_SEED);
        assert_eq!(reader.wire_checksum().unwrap(), 0xffff);
    }
}
