//! Connections - A daily word-grouping puzzle
//!
//! Core modules:
//! - `puzzle`: Puzzle data (groups, levels, words) and source validation
//! - `session`: Selection, guessing and win/loss state machine
//! - `persistence`: Day-scoped snapshot and lifetime stats storage
//! - `stats`: Lifetime statistics record and summaries
//! - `settings`: Native frontend configuration

pub mod persistence;
pub mod puzzle;
pub mod session;
pub mod settings;
pub mod stats;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use persistence::{GameStorage, Snapshot, Storage, StorageError};
pub use puzzle::{GroupKey, Puzzle, PuzzleCollection, PuzzleError};
pub use session::{GuessResult, Intent, Outcome, Session, SessionEvent};
pub use settings::Settings;
pub use stats::Stats;

/// Game configuration constants
pub mod consts {
    /// Words in every group
    pub const GROUP_SIZE: usize = 4;
    /// Groups in every puzzle
    pub const GROUP_COUNT: usize = 4;
    /// Words on a fresh board
    pub const WORD_COUNT: usize = GROUP_SIZE * GROUP_COUNT;
    /// Mistakes allowed before the game is lost
    pub const MAX_MISTAKES: u8 = 4;

    /// Storage key for the day-scoped session snapshot
    pub const STATE_KEY: &str = "connectionsGameState";
    /// Storage key for lifetime statistics
    pub const STATS_KEY: &str = "connectionsGameStats";
}
