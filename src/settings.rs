//! Frontend settings
//!
//! Persisted as JSON next to the game data. Missing fields fall back to
//! defaults so older settings files keep loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Puzzle source (JSON)
    pub puzzle_path: PathBuf,
    /// Directory holding saved progress and stats
    pub data_dir: PathBuf,
    /// Fixed shuffle seed (random when unset)
    pub seed: Option<u64>,
    /// Print every group after a loss
    pub reveal_solution_on_loss: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            puzzle_path: PathBuf::from("puzzles.json"),
            data_dir: PathBuf::from(".connections"),
            seed: None,
            reveal_solution_on_loss: true,
        }
    }
}

impl Settings {
    /// Settings file name inside the data directory
    pub const FILE_NAME: &'static str = "settings.json";

    /// Load settings from a file; a missing file gives the defaults
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = serde_json::from_str(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Seed to use for this run
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Json(#[from] serde_json::Error),
}
