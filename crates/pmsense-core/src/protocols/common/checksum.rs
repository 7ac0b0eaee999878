/// Add every byte to `seed` as an unsigned 16-bit sum, wrapping on overflow.
pub(crate) fn wrapping_sum_u16(seed: u16, bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(seed, |acc, &b| acc.wrapping_add(u16::from(b)))
}
