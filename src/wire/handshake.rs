//! # Handshake Responder
//!
//! Builds the handshake response frame and schedules its periodic transmission.
//!
//! A response is sent immediately for every handshake request, and also every
//! [`HANDSHAKE_INTERVAL`] whether or not a request was seen, so peers that only
//! listen still learn that the gateway is present. The two triggers are
//! independent.

use tokio::time::{Duration, Instant};

use super::checksum::compute;
use super::protocol::*;

/// Default period of the unsolicited handshake response
pub const HANDSHAKE_INTERVAL: Duration = Duration::from_millis(2500);

/// Encode the handshake response frame
///
/// # Returns
///
/// * `[u8; 8]` - `11 05 'L' 'D' '2' 'N' 'D' CK`
///
/// # Examples
///
/// ```
/// use dawn_link::wire::handshake::build_response;
///
/// let frame = build_response();
/// assert_eq!(&frame[..7], &[0x11, 0x05, b'L', b'D', b'2', b'N', b'D']);
/// assert_eq!(frame[7], 0x95);
/// ```
pub fn build_response() -> [u8; HANDSHAKE_RESPONSE_FRAME_SIZE] {
    let mut frame = [0u8; HANDSHAKE_RESPONSE_FRAME_SIZE];
    frame[0] = MSG_HANDSHAKE_RESPONSE;
    frame[1] = HANDSHAKE_RESPONSE_TOKEN.len() as u8;
    frame[2..7].copy_from_slice(HANDSHAKE_RESPONSE_TOKEN);
    frame[7] = compute(&frame[..7]);
    frame
}

/// Periodic trigger for unsolicited handshake responses
#[derive(Debug, Clone)]
pub struct HandshakeTimer {
    interval: Duration,
    last_fire: Instant,
}

impl HandshakeTimer {
    /// Create a timer whose first period starts at `now`
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_fire: now,
        }
    }

    /// Configured period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` (and restarts the period) once `interval` has elapsed
    ///
    /// Responses sent on request do not reset the timer.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_fire) < self.interval {
            return false;
        }

        self.last_fire = now;
        true
    }
}
