//! # Stream Framer
//!
//! Incremental length-prefixed framer for the New Dawn byte stream.
//!
//! Bytes arrive in arbitrary chunks and are staged in a bounded accumulation
//! buffer. A frame is cut as soon as `3 + length` bytes are buffered, whether
//! or not its checksum is valid: the declared length alone decides where the
//! next frame starts. There is no byte-wise rescan for a header.
//!
//! If the buffer fills up without a complete frame becoming available (for
//! example a corrupted length byte announcing a frame larger than the
//! buffer), everything buffered is thrown away.

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use super::protocol::{RawFrame, FRAME_HEADER_SIZE, FRAME_OVERHEAD};
use crate::error::{LinkError, Result};

/// Default accumulation buffer capacity in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Bounded accumulation buffer plus frame extraction
#[derive(Debug)]
pub struct Framer {
    buf: BytesMut,
    capacity: usize,
}

impl Framer {
    /// Create a framer with the given buffer capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered and not yet framed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Room left before the buffer is full
    pub fn free_space(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Append received bytes
    ///
    /// At most [`free_space`](Self::free_space) bytes are taken; the number of
    /// accepted bytes is returned. Callers size their reads so that nothing is
    /// refused.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free_space());
        if accepted < data.len() {
            debug!("Framer refused {} bytes (buffer full)", data.len() - accepted);
        }
        self.buf.extend_from_slice(&data[..accepted]);
        accepted
    }

    /// Cut the next complete frame off the front of the buffer
    ///
    /// Returns `None` when fewer than two bytes are buffered or when the
    /// declared length describes a frame that has not fully arrived yet. In
    /// both cases the buffer is left untouched.
    pub fn next_frame(&mut self) -> Option<RawFrame> {
        if self.buf.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let id = self.buf[0];
        let length = self.buf[1];
        let total = FRAME_OVERHEAD + length as usize;

        if self.buf.len() < total {
            return None;
        }

        debug!("Framed {} bytes: {:02X?}", total, &self.buf[..total]);

        self.buf.advance(FRAME_HEADER_SIZE);
        let payload = self.buf.split_to(length as usize).freeze();
        let checksum = self.buf.get_u8();

        Some(RawFrame {
            id,
            length,
            payload,
            checksum,
        })
    }

    /// Cut every complete frame currently buffered
    pub fn drain_frames(&mut self) -> Vec<RawFrame> {
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    /// Reset the buffer if it is full
    ///
    /// Call after all complete frames have been drained. A full buffer at that
    /// point can never yield a frame, so its contents are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::BufferOverflow`] with the number of dropped bytes
    /// when the buffer was reset.
    pub fn enforce_capacity(&mut self) -> Result<()> {
        if self.buf.len() < self.capacity {
            return Ok(());
        }

        let discarded = self.buf.len();
        warn!("Buffer overflow, resetting ({} bytes discarded)", discarded);
        self.clear();
        Err(LinkError::BufferOverflow { discarded })
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::checksum::compute;
    use crate::wire::protocol::*;

    fn build_frame(id: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = vec![id, payload.len() as u8];
        frame.extend_from_slice(payload);
        frame.push(compute(&frame));
        frame
    }

    fn status_frame(speed: i16) -> Vec<u8> {
        let status = MachineStatus { speed, ..Default::default() };
        build_frame(MSG_MACHINE_STATUS, &status.to_payload())
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut framer = Framer::default();
        assert!(framer.next_frame().is_none());

        framer.push(&[MSG_MACHINE_STATUS]);
        assert!(framer.next_frame().is_none());
        assert_eq!(framer.buffered(), 1);
    }

    #[test]
    fn test_partial_frame_left_untouched() {
        let frame = status_frame(100);
        let mut framer = Framer::default();

        framer.push(&frame[..frame.len() - 1]);
        assert!(framer.next_frame().is_none());
        assert_eq!(framer.buffered(), frame.len() - 1);

        framer.push(&frame[frame.len() - 1..]);
        let raw = framer.next_frame().unwrap();
        assert_eq!(raw.id, MSG_MACHINE_STATUS);
        assert_eq!(raw.length, 10);
        assert_eq!(raw.checksum, frame[12]);
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_zero_length_frame() {
        let mut framer = Framer::default();
        framer.push(&build_frame(0x42, &[]));

        let raw = framer.next_frame().unwrap();
        assert_eq!(raw.id, 0x42);
        assert!(raw.payload.is_empty());
        assert_eq!(raw.wire_size(), 3);
    }

    #[test]
    fn test_back_to_back_frames_any_chunk_size() {
        let first = status_frame(1111);
        let second = build_frame(MSG_HANDSHAKE_REQUEST, HANDSHAKE_REQUEST_TOKEN);
        let stream: Vec<u8> = first.iter().chain(second.iter()).copied().collect();

        for chunk_size in 1..=stream.len() {
            let mut framer = Framer::default();
            let mut frames = Vec::new();

            for chunk in stream.chunks(chunk_size) {
                assert_eq!(framer.push(chunk), chunk.len());
                frames.extend(framer.drain_frames());
            }

            assert_eq!(frames.len(), 2, "chunk size {}", chunk_size);
            assert_eq!(frames[0].id, MSG_MACHINE_STATUS);
            assert_eq!(&frames[0].payload[..], &first[2..12]);
            assert_eq!(frames[1].id, MSG_HANDSHAKE_REQUEST);
            assert_eq!(&frames[1].payload[..], HANDSHAKE_REQUEST_TOKEN);
            assert_eq!(framer.buffered(), 0);
        }
    }

    #[test]
    fn test_bad_checksum_still_consumed_by_length() {
        let mut bad = status_frame(5);
        bad[12] ^= 0xFF;
        let good = status_frame(6);

        let mut framer = Framer::default();
        framer.push(&bad);
        framer.push(&good);

        let frames = framer.drain_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].checksum, bad[12]);
        assert_eq!(frames[1].checksum, good[12]);
    }

    #[test]
    fn test_leftover_bytes_kept_at_start() {
        let frame = status_frame(7);
        let next = status_frame(8);

        let mut framer = Framer::default();
        framer.push(&frame);
        framer.push(&next[..4]);

        assert_eq!(framer.drain_frames().len(), 1);
        assert_eq!(framer.buffered(), 4);

        framer.push(&next[4..]);
        let raw = framer.next_frame().unwrap();
        assert_eq!(&raw.payload[..], &next[2..12]);
    }

    #[test]
    fn test_corrupted_length_discards_buffer() {
        let mut framer = Framer::new(64);

        // Length 0xF0 describes a 243-byte frame that can never fit
        framer.push(&[MSG_MACHINE_STATUS, 0xF0]);
        while framer.free_space() > 0 {
            framer.push(&[0x55; 16]);
            assert!(framer.next_frame().is_none());
            if framer.free_space() > 0 {
                assert!(framer.enforce_capacity().is_ok());
            }
        }

        match framer.enforce_capacity() {
            Err(LinkError::BufferOverflow { discarded }) => assert_eq!(discarded, 64),
            other => panic!("Expected BufferOverflow, got: {:?}", other),
        }
        assert_eq!(framer.buffered(), 0);

        // Framing restarts with the next byte
        framer.push(&status_frame(9));
        assert!(framer.next_frame().is_some());
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut framer = Framer::new(16);
        assert_eq!(framer.push(&[0u8; 10]), 10);
        assert_eq!(framer.push(&[0u8; 10]), 6);
        assert_eq!(framer.free_space(), 0);
        assert_eq!(framer.capacity(), 16);
    }
}
