//! # Link Driver Loop
//!
//! One iteration of the loop:
//!
//! 1. **AwaitingBytes** - read whatever the transport has, waiting at most
//!    `read_timeout`. This is the only place the loop suspends.
//! 2. **Framing** - append to the accumulation buffer and cut every complete
//!    frame.
//! 3. **Dispatching** - validate each frame, then update the telemetry store,
//!    send a handshake response, or drop it.
//! 4. Reset the buffer if it filled without producing a frame, fire the
//!    periodic handshake if due, emit the status report if due.
//!
//! Nothing in the loop is fatal. Malformed frames, buffer overflows, store
//! contention and transport errors are logged and counted.

use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{LinkError, Result};
use crate::serial::LinkTransport;
use crate::telemetry::{TelemetrySnapshot, TelemetryStore};
use crate::wire::dispatcher::{dispatch, Message};
use crate::wire::framer::{Framer, DEFAULT_BUFFER_CAPACITY};
use crate::wire::handshake::{build_response, HandshakeTimer, HANDSHAKE_INTERVAL};
use crate::wire::protocol::RawFrame;

/// Default bound on a single transport read
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(20);

/// Default period of the link status report
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_millis(5000);

/// Tunables of the link driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSettings {
    /// Accumulation buffer capacity in bytes
    pub buffer_capacity: usize,
    /// Bound on a single transport read
    pub read_timeout: Duration,
    /// Period of the unsolicited handshake response
    pub handshake_interval: Duration,
    /// Period of the status report
    pub status_interval: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            handshake_interval: HANDSHAKE_INTERVAL,
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

impl From<&Config> for LinkSettings {
    fn from(config: &Config) -> Self {
        Self {
            buffer_capacity: config.link.buffer_capacity,
            read_timeout: config.serial.read_timeout(),
            handshake_interval: config.link.handshake_interval(),
            status_interval: config.link.status_interval(),
        }
    }
}

/// Link counters since start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Bytes read from the transport
    pub bytes_received: u64,
    /// Complete frames cut from the stream, valid or not
    pub frames_received: u64,
    /// Machine Status frames written to the store
    pub telemetry_updates: u64,
    /// Valid handshake requests from the peer
    pub handshake_requests: u64,
    /// Handshake responses written, on request or by timer
    pub handshakes_sent: u64,
    /// Frames dropped for a bad checksum
    pub checksum_errors: u64,
    /// Frames dropped for an unknown type or length
    pub rejected_frames: u64,
    /// Buffer resets after filling without a complete frame
    pub buffer_overflows: u64,
    /// Telemetry updates dropped because the store was busy
    pub store_contentions: u64,
}

/// Why a handshake response is being sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeTrigger {
    Request,
    Timer,
}

/// Content of one periodic status report
#[derive(Debug, Clone, Copy, PartialEq)]
enum StatusReport {
    Receiving {
        age_ms: u32,
        speed_kmh: f32,
        steer_angle_deg: f32,
    },
    NoData,
    StoreBusy,
}

/// Owns the link state and runs the receive loop
pub struct LinkDriver<T: LinkTransport> {
    transport: T,
    framer: Framer,
    store: TelemetryStore,
    clock: Clock,
    handshake: HandshakeTimer,
    read_timeout: Duration,
    status_interval: Duration,
    last_status: Instant,
    read_buf: Vec<u8>,
    stats: LinkStats,
}

impl<T: LinkTransport> LinkDriver<T> {
    /// Create a driver over `transport`, writing into `store`
    ///
    /// The handshake and status periods start at the clock's epoch.
    pub fn new(transport: T, store: TelemetryStore, clock: Clock, settings: LinkSettings) -> Self {
        Self {
            transport,
            framer: Framer::new(settings.buffer_capacity),
            store,
            clock,
            handshake: HandshakeTimer::new(settings.handshake_interval, clock.epoch()),
            read_timeout: settings.read_timeout,
            status_interval: settings.status_interval,
            last_status: clock.epoch(),
            read_buf: vec![0u8; settings.buffer_capacity],
            stats: LinkStats::default(),
        }
    }

    /// Counters since start
    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    /// Bytes waiting in the accumulation buffer
    pub fn buffered(&self) -> usize {
        self.framer.buffered()
    }

    /// Run the loop for the lifetime of the task
    ///
    /// Never returns; stop it by dropping the future (task abort or
    /// `tokio::select!`).
    pub async fn run(&mut self) {
        info!("Link driver started, waiting for data");

        loop {
            self.step().await;
        }
    }

    /// Run one loop iteration
    pub async fn step(&mut self) {
        let free = self.framer.free_space();

        let read = self
            .transport
            .read_available(&mut self.read_buf[..free], self.read_timeout)
            .await;

        match read {
            Ok(0) => {}
            Ok(len) => {
                debug!("Received {} bytes", len);
                self.stats.bytes_received += len as u64;
                self.framer.push(&self.read_buf[..len]);
                self.process_frames().await;
            }
            Err(e) => {
                warn!("Serial read failed: {}", e);
                tokio::time::sleep(self.read_timeout).await;
            }
        }

        let now = Instant::now();

        if self.handshake.poll(now) {
            self.send_handshake(HandshakeTrigger::Timer).await;
        }

        if now.saturating_duration_since(self.last_status) >= self.status_interval {
            self.last_status = now;
            let snapshot = self.store.snapshot().await;
            self.log_status(self.status_report(now, snapshot));
        }
    }

    async fn process_frames(&mut self) {
        let now_ms = self.clock.now_ms();

        for frame in self.framer.drain_frames() {
            self.handle_frame(&frame, now_ms).await;
        }

        if self.framer.enforce_capacity().is_err() {
            self.stats.buffer_overflows += 1;
        }
    }

    async fn handle_frame(&mut self, frame: &RawFrame, now_ms: u32) {
        self.stats.frames_received += 1;

        match dispatch(frame, now_ms) {
            Ok(Message::Telemetry { status, timestamp_ms }) => {
                match self.store.update(status, timestamp_ms).await {
                    Ok(()) => self.stats.telemetry_updates += 1,
                    Err(e) => {
                        self.stats.store_contentions += 1;
                        debug!("{}", e);
                    }
                }
            }
            Ok(Message::HandshakeRequest) => {
                self.stats.handshake_requests += 1;
                self.send_handshake(HandshakeTrigger::Request).await;
            }
            Err(e @ LinkError::ChecksumMismatch { .. }) => {
                self.stats.checksum_errors += 1;
                warn!("{}", e);
            }
            Err(e) => {
                self.stats.rejected_frames += 1;
                warn!("{}", e);
            }
        }
    }

    async fn send_handshake(&mut self, trigger: HandshakeTrigger) {
        let response = build_response();

        match self.transport.write_all(&response).await {
            Ok(()) => {
                self.stats.handshakes_sent += 1;
                debug!("Sent handshake response ({:?})", trigger);
            }
            Err(e) => warn!("Failed to send handshake response: {}", e),
        }
    }

    fn status_report(&self, now: Instant, snapshot: Result<TelemetrySnapshot>) -> StatusReport {
        match snapshot {
            Ok(snapshot) if snapshot.valid => StatusReport::Receiving {
                age_ms: Clock::age_ms(snapshot.timestamp_ms, self.clock.ms_at(now)),
                speed_kmh: snapshot.status.speed_kmh(),
                steer_angle_deg: snapshot.status.steer_angle_deg(),
            },
            Ok(_) => StatusReport::NoData,
            Err(_) => StatusReport::StoreBusy,
        }
    }

    fn log_status(&self, report: StatusReport) {
        match report {
            StatusReport::Receiving {
                age_ms,
                speed_kmh,
                steer_angle_deg,
            } => info!(
                "Receiving data - Age: {} ms, Speed: {:.2} km/h, WAS: {:.1} deg",
                age_ms, speed_kmh, steer_angle_deg
            ),
            StatusReport::NoData => info!("No data received from New Dawn yet"),
            StatusReport::StoreBusy => debug!("Telemetry store busy, status report skipped"),
        }

        debug!(stats = ?self.stats, "Link counters");
    }
}
