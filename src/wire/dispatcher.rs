//! # Frame Dispatcher
//!
//! Validates candidate frames and decodes them into typed messages.

use tracing::debug;

use super::checksum::compute;
use super::protocol::*;
use crate::error::{LinkError, Result};

/// A validated message received from the peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Fresh machine state, stamped with the time it was dispatched
    Telemetry {
        /// Decoded machine status
        status: MachineStatus,
        /// Link clock time in milliseconds
        timestamp_ms: u32,
    },

    /// Peer asked for a handshake response
    HandshakeRequest,
}

/// Validate and decode one candidate frame
///
/// Every frame yields exactly one outcome: a [`Message`] or a rejection.
///
/// # Arguments
///
/// * `frame` - Candidate frame as cut by the framer
/// * `now_ms` - Current link clock time, used to stamp telemetry
///
/// # Errors
///
/// Returns error if:
/// - The checksum over id, length and payload does not match
///   ([`LinkError::ChecksumMismatch`])
/// - The id/length combination (or handshake token) is not recognised
///   ([`LinkError::UnknownFrame`])
pub fn dispatch(frame: &RawFrame, now_ms: u32) -> Result<Message> {
    let expected = compute(&frame.checksummed_bytes());
    if expected != frame.checksum {
        return Err(LinkError::ChecksumMismatch {
            expected,
            received: frame.checksum,
        });
    }

    match (frame.id, frame.length as usize) {
        (MSG_MACHINE_STATUS, MACHINE_STATUS_PAYLOAD_SIZE) => {
            let status = MachineStatus::from_payload(&frame.payload).ok_or(LinkError::UnknownFrame {
                id: frame.id,
                length: frame.length,
            })?;

            debug!(
                "Machine Status - Speed: {:.2} km/h, WAS: {:.1} deg",
                status.speed_kmh(),
                status.steer_angle_deg()
            );

            Ok(Message::Telemetry {
                status,
                timestamp_ms: now_ms,
            })
        }
        (MSG_HANDSHAKE_REQUEST, len)
            if len == HANDSHAKE_REQUEST_TOKEN.len() && frame.payload[..] == HANDSHAKE_REQUEST_TOKEN[..] =>
        {
            debug!("Handshake request received");
            Ok(Message::HandshakeRequest)
        }
        _ => Err(LinkError::UnknownFrame {
            id: frame.id,
            length: frame.length,
        }),
    }
}
