//! Frame report wire format.
//!
//! ## Wire Format
//!
//! Exactly one report per datagram, exactly [`REPORT_LEN`] bytes, all fields
//! little-endian. The layout is fixed by the codec, never by in-memory
//! struct layout, so both ends agree byte-for-byte regardless of platform.
//!
//! | Field           | Bytes |
//! |-----------------|-------|
//! | `client`        | 0..8  |
//! | `frame_time_ns` | 8..16 |
//! | `frame_number`  | 16..24|

use std::fmt;

use thiserror::Error;

/// Size of an encoded [`FrameReport`] datagram.
pub const REPORT_LEN: usize = 24;

/// Opaque 64-bit client identity, chosen once per client process lifetime.
///
/// Drawn from an OS-entropy-seeded generator at startup; the aggregator
/// performs no collision detection and treats any unseen id as a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl ClientId {
    /// Generates a fresh random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl From<u64> for ClientId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Errors during report decode.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Datagram length differs from the fixed report size.
    #[error("expected 24-byte report datagram, got {0} bytes")]
    BadLength(usize),
}

/// One per-frame timing report, sent once per client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// Identity of the reporting client.
    pub client: ClientId,
    /// Measured duration of the frame, nanoseconds.
    pub frame_time_ns: u64,
    /// Frame counter, strictly increasing per client, starting at 0.
    pub frame_number: u64,
}

impl FrameReport {
    /// Encodes the report into its fixed 24-byte wire form.
    #[must_use]
    pub fn encode(&self) -> [u8; REPORT_LEN] {
        let mut buf = [0u8; REPORT_LEN];
        buf[0..8].copy_from_slice(&self.client.0.to_le_bytes());
        buf[8..16].copy_from_slice(&self.frame_time_ns.to_le_bytes());
        buf[16..24].copy_from_slice(&self.frame_number.to_le_bytes());
        buf
    }

    /// Decodes a report from a received datagram.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::BadLength`] unless `bytes` is exactly
    /// [`REPORT_LEN`] bytes. A short or long datagram is malformed as a
    /// whole; no partial decode is attempted.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() != REPORT_LEN {
            return Err(WireError::BadLength(bytes.len()));
        }

        let take_u64 = |range: std::ops::Range<usize>| {
            let mut arr = [0u8; 8];
            arr.copy_from_slice(&bytes[range]);
            u64::from_le_bytes(arr)
        };

        Ok(Self {
            client: ClientId(take_u64(0..8)),
            frame_time_ns: take_u64(8..16),
            frame_number: take_u64(16..24),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout_is_fixed() {
        let report = FrameReport {
            client: ClientId(0x0807_0605_0403_0201),
            frame_time_ns: 0x1817_1615_1413_1211,
            frame_number: 0x2827_2625_2423_2221,
        };
        let bytes = report.encode();
        assert_eq!(
            bytes,
            [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // client
                0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, // frame_time_ns
                0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, // frame_number
            ]
        );
    }

    #[test]
    fn roundtrip() {
        let report = FrameReport {
            client: ClientId(0xdead_beef_cafe_f00d),
            frame_time_ns: 33_333_333,
            frame_number: 42,
        };
        let decoded = FrameReport::decode(&report.encode()).unwrap();
        assert_eq!(decoded, report);
    }

    #[test]
    fn decode_rejects_short_datagram() {
        assert_eq!(
            FrameReport::decode(&[0u8; 10]),
            Err(WireError::BadLength(10))
        );
    }

    #[test]
    fn decode_rejects_long_datagram() {
        assert_eq!(
            FrameReport::decode(&[0u8; 32]),
            Err(WireError::BadLength(32))
        );
    }

    #[test]
    fn decode_rejects_empty_datagram() {
        assert_eq!(FrameReport::decode(&[]), Err(WireError::BadLength(0)));
    }

    #[test]
    fn client_id_display_is_hex() {
        assert_eq!(format!("{}", ClientId(0xabcd)), "0x000000000000abcd");
    }

    #[test]
    fn generated_ids_differ() {
        // 64 random bits; a collision here means the entropy source is broken
        assert_ne!(ClientId::generate(), ClientId::generate());
    }
}
