//! CommKey derivation for password-protected devices
//!
//! Devices with a communication password answer CONNECT with
//! `CMD_ACK_UNAUTH` and expect a `CMD_AUTH` carrying the password scrambled
//! with the session id (the `MakeKey` routine of the vendor SDK).

/// Scramble `password` with `session_id` into the 4-byte AUTH payload
///
/// Steps: bit-reverse the password, add the session id, XOR with
/// `"ZKSO"`, swap the 16-bit halves, then mix in `ticks`.
///
/// # Examples
///
/// ```
/// use zkattend_core::auth;
///
/// let key = auth::make_commkey(0, 32031, 50);
/// assert_eq!(key.len(), 4);
/// assert_eq!(key[2], 50);
/// ```
pub fn make_commkey(password: u32, session_id: u16, ticks: u8) -> [u8; 4] {
    let key = password.reverse_bits().wrapping_add(u32::from(session_id));

    let [b0, b1, b2, b3] = key.to_le_bytes();
    let mixed = [b0 ^ b'Z', b1 ^ b'K', b2 ^ b'S', b3 ^ b'O'];

    // high half first
    let swapped = [mixed[2], mixed[3], mixed[0], mixed[1]];

    [
        swapped[0] ^ ticks,
        swapped[1] ^ ticks,
        ticks,
        swapped[3] ^ ticks,
    ]
}
