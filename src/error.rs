//! # Error Types
//!
//! Custom error types for Dawn Link using `thiserror`.
//!
//! The protocol variants (`ChecksumMismatch`, `UnknownFrame`, `BufferOverflow`,
//! `StoreContention`) are never fatal: the link driver logs them and keeps running.

use thiserror::Error;

/// Main error type for Dawn Link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Frame bytes fully present but the checksum does not match
    #[error("frame rejected: checksum (expected 0x{expected:02X}, got 0x{received:02X})")]
    ChecksumMismatch {
        /// Checksum computed over id, length and payload
        expected: u8,
        /// Checksum byte carried by the frame
        received: u8,
    },

    /// Frame id/length combination is not a known message
    #[error("frame rejected: unknown type or length mismatch (id 0x{id:02X}, length {length})")]
    UnknownFrame {
        /// Frame id byte
        id: u8,
        /// Declared payload length
        length: u8,
    },

    /// Accumulation buffer filled up without yielding a complete frame
    #[error("accumulation buffer overflow, {discarded} bytes discarded")]
    BufferOverflow {
        /// Number of bytes dropped when the buffer was reset
        discarded: usize,
    },

    /// Telemetry store lock could not be acquired within its timeout
    #[error("telemetry store busy, operation skipped")]
    StoreContention,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Dawn Link
pub type Result<T> = std::result::Result<T, LinkError>;
