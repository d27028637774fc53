//! # Dawn Link Library
//!
//! Serial telemetry link between a New Dawn guidance unit and a display gateway.
//!
//! This library recovers checksummed, length-prefixed frames from the raw
//! UART byte stream, keeps the latest Machine Status available to display
//! consumers and answers the peer's handshake.

pub mod clock;
pub mod config;
pub mod error;
pub mod link;
pub mod serial;
pub mod telemetry;
pub mod wire;
