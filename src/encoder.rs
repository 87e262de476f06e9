//! Telegram encoder (component C, §4.C): serialises an outbound command
//! into the on-wire byte layout.

use crate::address::POLL_OR_RESPONSE_BIT;

/// Serialise one outbound command.
///
/// The source byte is omitted — the link layer inserts it. If
/// `expect_response` is set, the destination's high bit is set to request
/// one.
pub fn build(dest: u8, type_id: u8, offset: u8, payload: &[u8], expect_response: bool) -> Vec<u8> {
    let dest = if expect_response { dest | POLL_OR_RESPONSE_BIT } else { dest };
    let mut out = Vec::with_capacity(3 + payload.len());
    out.push(dest);
    out.push(type_id);
    out.push(offset);
    out.extend_from_slice(payload);
    out
}

/// Build a plain read request: no payload, response expected.
pub fn read_request(dest: u8, type_id: u8, offset: u8) -> Vec<u8> {
    build(dest, type_id, offset, &[], true)
}

/// Build a single-byte scaled-float write, e.g. a temperature setpoint.
///
/// `value` is multiplied by `divider` and truncated to the nearest byte;
/// the controller acknowledges writes without echoing the value, so no
/// response is requested.
pub fn write_scaled_u8(dest: u8, type_id: u8, offset: u8, value: f32, divider: u32) -> Vec<u8> {
    let raw = (value * divider as f32).round() as u8;
    build(dest, type_id, offset, &[raw], false)
}
