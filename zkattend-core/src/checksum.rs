//! Packet payload checksum
//!
//! The checksum is the sum of all payload bytes truncated to 16 bits.
//! Outgoing packets leave the header checksum at zero unless the client
//! opts in, and incoming checksums are never verified.

use tracing::trace;

/// Calculate the 16-bit truncated byte sum of `payload`
///
/// # Examples
///
/// ```
/// use zkattend_core::checksum;
///
/// assert_eq!(checksum::calculate(&[1, 2, 3]), 6);
/// assert_eq!(checksum::calculate(&[]), 0);
/// ```
pub fn calculate(payload: &[u8]) -> u16 {
    let checksum = payload
        .iter()
        .fold(0u16, |sum, &byte| sum.wrapping_add(u16::from(byte)));

    trace!(
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}
