//! Save/load persistence for daily progress and lifetime stats
//!
//! Features:
//! - Day-scoped session snapshot (discarded once the calendar date moves on)
//! - Lifetime stats record (never expires)
//! - Pluggable key-value backends (memory, files, browser LocalStorage)
//! - Injected clock so "today" is testable

pub mod backend;
pub mod clock;
pub mod snapshot;

pub use backend::MemoryStorage;
#[cfg(not(target_arch = "wasm32"))]
pub use backend::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use backend::LocalStorage;
pub use clock::{Clock, FixedClock, SystemClock};
pub use snapshot::Snapshot;

use chrono::NaiveDate;
use thiserror::Error;

use crate::consts::{STATE_KEY, STATS_KEY};
use crate::stats::Stats;

/// Raw string key-value storage
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Persistence failures (never fatal to a game in progress)
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored record could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot and stats records on top of a [`Storage`] backend
pub struct GameStorage<S> {
    backend: S,
    clock: Box<dyn Clock>,
}

impl<S: Storage> GameStorage<S> {
    /// Store using the local system calendar
    pub fn new(backend: S) -> Self {
        Self::with_clock(backend, SystemClock)
    }

    pub fn with_clock(backend: S, clock: impl Clock + 'static) -> Self {
        Self {
            backend,
            clock: Box::new(clock),
        }
    }

    /// Today's local calendar date
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Overwrite the stored snapshot
    pub fn save_state(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)?;
        self.backend.set(STATE_KEY, &json)?;
        log::debug!(
            "Snapshot saved ({} solved, {} mistakes left)",
            snapshot.solved_group_order.len(),
            snapshot.mistakes
        );
        Ok(())
    }

    /// Today's snapshot, if any. Stale or unreadable snapshots are cleared.
    pub fn load_state(&mut self) -> Result<Option<Snapshot>, StorageError> {
        let Some(json) = self.backend.get(STATE_KEY)? else {
            return Ok(None);
        };

        let snapshot = match serde_json::from_str::<Snapshot>(&json) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::warn!("Discarding unreadable snapshot: {e}");
                self.reset_state()?;
                return Ok(None);
            }
        };

        let today = self.today();
        if snapshot.last_played != today {
            log::info!(
                "Discarding snapshot from {} (today is {})",
                snapshot.last_played,
                today
            );
            self.reset_state()?;
            return Ok(None);
        }

        log::info!("Loaded snapshot from {}", snapshot.last_played);
        Ok(Some(snapshot))
    }

    pub fn reset_state(&mut self) -> Result<(), StorageError> {
        self.backend.remove(STATE_KEY)?;
        log::info!("Saved progress cleared");
        Ok(())
    }

    pub fn save_stats(&mut self, stats: &Stats) -> Result<(), StorageError> {
        let json = serde_json::to_string(stats)?;
        self.backend.set(STATS_KEY, &json)?;
        log::info!("Stats saved ({} games played)", stats.games_played);
        Ok(())
    }

    /// Lifetime stats, zeroed when nothing is stored
    pub fn load_stats(&self) -> Result<Stats, StorageError> {
        match self.backend.get(STATS_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Stats::default()),
        }
    }
}
