//! # Wire Protocol Module
//!
//! Implementation of the New Dawn serial link protocol.
//!
//! This module handles:
//! - One's-complement checksum calculation
//! - Frame extraction from the raw byte stream (length-prefixed framing)
//! - Frame validation and decoding (Machine Status, Handshake Request)
//! - Handshake response encoding and periodic scheduling

pub mod protocol;
pub mod checksum;
pub mod framer;
pub mod dispatcher;
pub mod handshake;
