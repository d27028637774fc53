//! # Shared Telemetry Store
//!
//! Single-slot cache of the most recently validated Machine Status.
//!
//! The link driver is the only writer; any number of display consumers read
//! through cloned handles. Every access takes the lock with a short timeout.
//! A writer that cannot get the lock drops its update and a reader gets
//! nothing; the previous snapshot stays in place and consumers judge
//! staleness from its timestamp.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{LinkError, Result};
use crate::wire::protocol::MachineStatus;

/// Default bound on lock acquisition
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(10);

/// Latest machine state plus metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetrySnapshot {
    /// Last decoded machine status
    pub status: MachineStatus,

    /// False until the first Machine Status frame is accepted
    pub valid: bool,

    /// Link clock time of the last update in milliseconds
    pub timestamp_ms: u32,
}

/// What a display consumer renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TelemetryView {
    /// Speed in 0.01 km/h
    pub speed: i16,
    /// Heading in 0.1 degrees
    pub heading: i16,
    /// Roll in 0.1 degrees
    pub roll: i16,
    /// Pitch in 0.1 degrees
    pub pitch: i16,
    /// Steer angle in 0.1 degrees
    pub steer_angle: i16,
    /// Whether the fields hold received data
    pub valid: bool,
    /// Milliseconds since the data was received
    pub age_ms: u32,
}

impl TelemetryView {
    /// View shown before any data arrived
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Render a snapshot as seen at `now_ms`
    pub fn from_snapshot(snapshot: &TelemetrySnapshot, now_ms: u32) -> Self {
        Self {
            speed: snapshot.status.speed,
            heading: snapshot.status.heading,
            roll: snapshot.status.roll,
            pitch: snapshot.status.pitch,
            steer_angle: snapshot.status.steer_angle,
            valid: snapshot.valid,
            age_ms: Clock::age_ms(snapshot.timestamp_ms, now_ms),
        }
    }
}

/// Cloneable handle to the shared snapshot
#[derive(Debug, Clone)]
pub struct TelemetryStore {
    slot: Arc<Mutex<TelemetrySnapshot>>,
    lock_timeout: Duration,
}

impl TelemetryStore {
    /// Create an empty (invalid) store
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(TelemetrySnapshot::default())),
            lock_timeout,
        }
    }

    /// Lock acquisition bound
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Replace the snapshot and mark it valid
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::StoreContention`] if the lock was not acquired
    /// within the timeout. The update is dropped in that case.
    pub async fn update(&self, status: MachineStatus, timestamp_ms: u32) -> Result<()> {
        let mut slot = timeout(self.lock_timeout, self.slot.lock())
            .await
            .map_err(|_| LinkError::StoreContention)?;

        *slot = TelemetrySnapshot {
            status,
            valid: true,
            timestamp_ms,
        };
        Ok(())
    }

    /// Copy of the slot, valid or not
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::StoreContention`] if the lock was not acquired
    /// within the timeout.
    pub async fn snapshot(&self) -> Result<TelemetrySnapshot> {
        let slot = timeout(self.lock_timeout, self.slot.lock())
            .await
            .map_err(|_| LinkError::StoreContention)?;
        Ok(*slot)
    }

    /// Copy of the current snapshot
    ///
    /// Returns `None` if nothing valid has been stored yet or the lock could
    /// not be acquired in time.
    pub async fn read(&self) -> Option<TelemetrySnapshot> {
        match self.snapshot().await {
            Ok(snapshot) if snapshot.valid => Some(snapshot),
            Ok(_) => None,
            Err(_) => {
                debug!("Telemetry store busy, read skipped");
                None
            }
        }
    }

    /// Display view at `now_ms`, or [`TelemetryView::invalid`] when no
    /// snapshot is available
    pub async fn view(&self, now_ms: u32) -> TelemetryView {
        self.read()
            .await
            .map(|snapshot| TelemetryView::from_snapshot(&snapshot, now_ms))
            .unwrap_or_else(TelemetryView::invalid)
    }

    /// Hold the lock so other accessors time out
    #[cfg(test)]
    pub(crate) async fn hold(&self) -> tokio::sync::MutexGuard<'_, TelemetrySnapshot> {
        self.slot.lock().await
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn sample_status() -> MachineStatus {
        MachineStatus {
            speed: 845,
            heading: 2700,
            roll: 3,
            pitch: -4,
            steer_angle: 120,
        }
    }

    #[tokio::test]
    async fn test_empty_store_reads_none() {
        let store = TelemetryStore::default();
        assert!(store.read().await.is_none());
        assert_eq!(store.view(1000).await, TelemetryView::invalid());
    }

    #[tokio::test]
    async fn test_update_then_read() {
        let store = TelemetryStore::default();
        assert_ok!(store.update(sample_status(), 1200).await);

        let snapshot = store.read().await.unwrap();
        assert_eq!(snapshot.status, sample_status());
        assert!(snapshot.valid);
        assert_eq!(snapshot.timestamp_ms, 1200);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = TelemetryStore::default();
        store.update(MachineStatus::default(), 10).await.unwrap();
        store.update(sample_status(), 20).await.unwrap();

        let snapshot = store.read().await.unwrap();
        assert_eq!(snapshot.status, sample_status());
        assert_eq!(snapshot.timestamp_ms, 20);
    }

    #[tokio::test]
    async fn test_clones_share_slot() {
        let writer = TelemetryStore::default();
        let reader = writer.clone();

        writer.update(sample_status(), 5).await.unwrap();
        assert_eq!(reader.read().await.unwrap().status, sample_status());
    }

    #[tokio::test]
    async fn test_view_reports_age() {
        let store = TelemetryStore::default();
        store.update(sample_status(), 1000).await.unwrap();

        let view = store.view(1750).await;
        assert!(view.valid);
        assert_eq!(view.speed, 845);
        assert_eq!(view.heading, 2700);
        assert_eq!(view.roll, 3);
        assert_eq!(view.pitch, -4);
        assert_eq!(view.steer_angle, 120);
        assert_eq!(view.age_ms, 750);
    }

    #[tokio::test(start_paused = true)]
    async fn test_contended_update_is_dropped() {
        let store = TelemetryStore::new(Duration::from_millis(10));
        store.update(MachineStatus::default(), 1).await.unwrap();

        let guard = store.hold().await;
        let err = assert_err!(store.update(sample_status(), 2).await);
        assert!(matches!(err, LinkError::StoreContention));
        assert!(store.read().await.is_none());
        assert!(matches!(store.snapshot().await, Err(LinkError::StoreContention)));
        drop(guard);

        // Previous snapshot is retained
        let snapshot = store.read().await.unwrap();
        assert_eq!(snapshot.status, MachineStatus::default());
        assert_eq!(snapshot.timestamp_ms, 1);
    }

    #[tokio::test]
    async fn test_snapshot_returns_empty_slot() {
        let store = TelemetryStore::default();
        let snapshot = assert_ok!(store.snapshot().await);
        assert!(!snapshot.valid);

        store.update(sample_status(), 7).await.unwrap();
        let snapshot = assert_ok!(store.snapshot().await);
        assert!(snapshot.valid);
        assert_eq!(snapshot.timestamp_ms, 7);
    }

    #[test]
    fn test_view_serializes_to_json() {
        let snapshot = TelemetrySnapshot {
            status: sample_status(),
            valid: true,
            timestamp_ms: 0,
        };
        let json = serde_json::to_value(TelemetryView::from_snapshot(&snapshot, 40)).unwrap();

        assert_eq!(json["speed"], 845);
        assert_eq!(json["steer_angle"], 120);
        assert_eq!(json["valid"], true);
        assert_eq!(json["age_ms"], 40);
    }
}
