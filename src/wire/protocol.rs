//! # Link Protocol Constants and Types
//!
//! Core protocol definitions for the New Dawn serial link.
//!
//! ```text
//! Frame := ID(1) LEN(1) PAYLOAD(LEN) CHECKSUM(1)
//! CHECKSUM = ~((ID + LEN + sum(PAYLOAD)) mod 256)
//! ```

use bytes::Bytes;
use serde::Serialize;

/// Serial baud rate used by the New Dawn unit
pub const LINK_BAUD_RATE: u32 = 460_800;

/// Machine Status message id
pub const MSG_MACHINE_STATUS: u8 = 0x01;

/// Handshake Request message id (peer -> gateway)
pub const MSG_HANDSHAKE_REQUEST: u8 = 0x10;

/// Handshake Response message id (gateway -> peer)
pub const MSG_HANDSHAKE_RESPONSE: u8 = 0x11;

/// Header size: id(1) + length(1)
pub const FRAME_HEADER_SIZE: usize = 2;

/// Bytes a frame adds around its payload: id(1) + length(1) + checksum(1)
pub const FRAME_OVERHEAD: usize = 3;

/// Machine Status payload size (five little-endian i16 fields)
pub const MACHINE_STATUS_PAYLOAD_SIZE: usize = 10;

/// Payload of a Handshake Request
pub const HANDSHAKE_REQUEST_TOKEN: &[u8; 5] = b"ND2LD";

/// Payload of a Handshake Response
pub const HANDSHAKE_RESPONSE_TOKEN: &[u8; 5] = b"LD2ND";

/// Complete Handshake Response frame size
pub const HANDSHAKE_RESPONSE_FRAME_SIZE: usize = FRAME_OVERHEAD + HANDSHAKE_RESPONSE_TOKEN.len();

/// Machine state reported by the New Dawn unit
///
/// Values are kept in their raw fixed-point wire units; use the accessor
/// methods for engineering units.
///
/// # Examples
///
/// ```
/// use dawn_link::wire::protocol::MachineStatus;
///
/// let status = MachineStatus { speed: 1250, steer_angle: -35, ..Default::default() };
/// assert_eq!(status.speed_kmh(), 12.5);
/// assert_eq!(status.steer_angle_deg(), -3.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MachineStatus {
    /// Ground speed in 0.01 km/h
    pub speed: i16,

    /// Heading in 0.1 degrees
    pub heading: i16,

    /// Roll in 0.1 degrees
    pub roll: i16,

    /// Pitch in 0.1 degrees
    pub pitch: i16,

    /// Wheel angle sensor reading in 0.1 degrees
    pub steer_angle: i16,
}

impl MachineStatus {
    /// Decode from the 10-byte little-endian payload
    ///
    /// Returns `None` unless `payload` is exactly
    /// [`MACHINE_STATUS_PAYLOAD_SIZE`] bytes long.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let raw: &[u8; MACHINE_STATUS_PAYLOAD_SIZE] = payload.try_into().ok()?;
        let field = |i: usize| i16::from_le_bytes([raw[2 * i], raw[2 * i + 1]]);

        Some(Self {
            speed: field(0),
            heading: field(1),
            roll: field(2),
            pitch: field(3),
            steer_angle: field(4),
        })
    }

    /// Encode into the 10-byte little-endian payload
    pub fn to_payload(&self) -> [u8; MACHINE_STATUS_PAYLOAD_SIZE] {
        let mut payload = [0u8; MACHINE_STATUS_PAYLOAD_SIZE];
        let fields = [self.speed, self.heading, self.roll, self.pitch, self.steer_angle];

        for (chunk, value) in payload.chunks_exact_mut(2).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }

        payload
    }

    /// Speed in km/h
    pub fn speed_kmh(&self) -> f32 {
        self.speed as f32 / 100.0
    }

    /// Heading in degrees
    pub fn heading_deg(&self) -> f32 {
        self.heading as f32 / 10.0
    }

    /// Roll in degrees
    pub fn roll_deg(&self) -> f32 {
        self.roll as f32 / 10.0
    }

    /// Pitch in degrees
    pub fn pitch_deg(&self) -> f32 {
        self.pitch as f32 / 10.0
    }

    /// Steer angle in degrees
    pub fn steer_angle_deg(&self) -> f32 {
        self.steer_angle as f32 / 10.0
    }
}

/// One candidate frame cut from the byte stream
///
/// The checksum has not been verified yet; see
/// [`dispatch`](super::dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Message id
    pub id: u8,

    /// Declared payload length
    pub length: u8,

    /// Payload bytes (`length` bytes)
    pub payload: Bytes,

    /// Checksum byte as received
    pub checksum: u8,
}

impl RawFrame {
    /// Total on-wire size of this frame
    pub fn wire_size(&self) -> usize {
        FRAME_OVERHEAD + self.length as usize
    }

    /// Bytes covered by the checksum (id + length + payload)
    pub fn checksummed_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        data.push(self.id);
        data.push(self.length);
        data.extend_from_slice(&self.payload);
        data
    }
}
