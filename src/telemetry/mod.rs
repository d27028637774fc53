//! # Telemetry Module
//!
//! Holds the latest machine state received over the link.
//!
//! This module handles:
//! - The single-slot telemetry snapshot shared between the link driver and
//!   display consumers
//! - Bounded-timeout locking so neither side can stall the other
//! - The display-facing view (`speed`, `heading`, ..., `valid`, `age_ms`)

pub mod store;

pub use store::{TelemetrySnapshot, TelemetryStore, TelemetryView};
