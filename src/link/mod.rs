//! # Link Module
//!
//! Drives the serial link: reads bytes, frames and dispatches them, keeps the
//! telemetry store current and answers handshakes.

pub mod driver;

pub use driver::{LinkDriver, LinkSettings, LinkStats};
