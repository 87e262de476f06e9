//! Raw bus frames and the logical-offset addressing scheme used by the
//! decoder's descriptors (§3, §4.B).

use bytes::Bytes;

/// One post-link-layer frame: `source | dest | type | offset | payload`.
///
/// The link layer (external to this crate) is responsible for CRC checking
/// and byte-stuffing/framing; by the time a `Frame` exists, those have
/// already passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub source: u8,
    pub dest: u8,
    pub type_id: u8,
    pub offset: u8,
    pub payload: Bytes,
}

impl Frame {
    /// Parse a frame out of a link-layer payload.
    ///
    /// Returns `None` if `bytes` is shorter than the four-byte header; the
    /// caller (the gateway) discards such frames silently, per spec.
    pub fn parse(bytes: impl Into<Bytes>) -> Option<Frame> {
        let bytes = bytes.into();
        if bytes.len() < 4 {
            return None;
        }
        Some(Frame {
            source: bytes[0],
            dest: bytes[1],
            type_id: bytes[2],
            offset: bytes[3],
            payload: bytes.slice(4..),
        })
    }

    /// `source == 0 && dest == 0 && type == 0`: the all-zero header the spec
    /// calls out as invalid regardless of payload.
    pub fn is_invalid_header(&self) -> bool {
        self.source == 0 && self.dest == 0 && self.type_id == 0
    }

    /// Whether the destination's high bit marks this as a polling request.
    pub fn is_polling(&self) -> bool {
        crate::address::wants_response(self.dest)
    }

    /// One past the last logical offset this frame's payload covers.
    pub fn logical_end(&self) -> usize {
        self.offset as usize + self.payload.len()
    }

    /// `canAccess(logical_offset, width)`: does this frame's payload fully
    /// cover `width` bytes starting at logical offset `logical_offset`?
    ///
    /// Boundary: `logical_offset + width == logical_end()` is in range
    /// (§8 boundary case).
    pub fn can_access(&self, logical_offset: usize, width: usize) -> bool {
        logical_offset >= self.offset as usize && logical_offset + width <= self.logical_end()
    }

    /// The `width`-byte slice at logical offset `logical_offset`, or `None`
    /// if it isn't fully within the payload.
    pub fn logical_bytes(&self, logical_offset: usize, width: usize) -> Option<&[u8]> {
        if !self.can_access(logical_offset, width) {
            return None;
        }
        let start = logical_offset - self.offset as usize;
        Some(&self.payload[start..start + width])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_is_none() {
        assert!(Frame::parse(&[0x00, 0x00, 0x05][..]).is_none());
    }

    #[test]
    fn parses_header_and_payload() {
        let f = Frame::parse(&[0x08, 0x0B, 0x18, 0x00, 0xAB, 0xCD][..]).unwrap();
        assert_eq!(f.source, 0x08);
        assert_eq!(f.dest, 0x0B);
        assert_eq!(f.type_id, 0x18);
        assert_eq!(f.offset, 0x00);
        assert_eq!(&f.payload[..], &[0xAB, 0xCD]);
    }

    #[test]
    fn invalid_all_zero_header() {
        let f = Frame::parse(&[0x00, 0x00, 0x00, 0x05, 0xAB, 0xCD][..]).unwrap();
        assert!(f.is_invalid_header());
    }

    #[test]
    fn can_access_boundary_is_inclusive() {
        let f = Frame::parse(&[0x08, 0x0B, 0x18, 0x02, 0xAA, 0xBB][..]).unwrap();
        // payload covers logical offsets 2..4
        assert!(f.can_access(2, 2));
        assert!(!f.can_access(2, 3));
        assert!(!f.can_access(1, 2));
    }

    #[test]
    fn logical_offset_shifts_indexing() {
        let f = Frame::parse(&[0x08, 0x0B, 0x18, 0x05, 0x11, 0x22, 0x33][..]).unwrap();
        assert_eq!(f.logical_bytes(5, 1), Some(&[0x11][..]));
        assert_eq!(f.logical_bytes(7, 1), Some(&[0x33][..]));
        assert_eq!(f.logical_bytes(8, 1), None);
        assert_eq!(f.logical_bytes(4, 1), None);
    }
}
