//! One-byte bus addresses for the controller modules this gateway understands.
//!
//! Values are opaque discriminators as far as the decoder is concerned; the
//! numbers below match the EMS-family controller's documented addressing.

/// Boiler controller (Heizungsautomat).
pub const UBA: u8 = 0x08;
/// BC10 bus coupler.
pub const BC10: u8 = 0x09;
/// Room controller (Raumcontroller).
pub const RC: u8 = 0x10;
/// Mixer/warm-water module.
pub const WM10: u8 = 0x11;
/// Second mixer module (HK2).
pub const MM10: u8 = 0x21;
/// This program's own bus address.
pub const PC: u8 = 0x0B;

/// High bit of a destination byte: marks a polling request when set on an
/// inbound frame, and is set by the encoder on an outbound frame to request
/// a response.
pub const POLL_OR_RESPONSE_BIT: u8 = 0x80;

/// Whether `dest` carries the polling/response-request bit.
pub fn wants_response(dest: u8) -> bool {
    dest & POLL_OR_RESPONSE_BIT != 0
}

/// Destination with the response-request bit masked off, i.e. the real
/// logical address it names.
pub fn bare(dest: u8) -> u8 {
    dest & !POLL_OR_RESPONSE_BIT
}
