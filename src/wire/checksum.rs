//! # One's-Complement Checksum
//!
//! 8-bit additive checksum used by the New Dawn link.
//!
//! **Algorithm**: sum of all bytes modulo 256, bitwise inverted.

/// Calculate the one's-complement checksum of a byte range
///
/// # Arguments
///
/// * `data` - Bytes covered by the checksum (ID + Length + Payload)
///
/// # Returns
///
/// * `u8` - Calculated checksum
///
/// # Examples
///
/// ```
/// use dawn_link::wire::checksum::compute;
///
/// assert_eq!(compute(&[]), 0xFF);
/// assert_eq!(compute(&[0x01, 0x02]), !0x03);
/// ```
pub fn compute(data: &[u8]) -> u8 {
    !data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Verify a claimed checksum against the covered bytes
pub fn verify(data: &[u8], claimed: u8) -> bool {
    compute(data) == claimed
}
