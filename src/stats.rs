//! Lifetime statistics
//!
//! Updated only when a game is won; never date scoped.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_MISTAKES;

/// Lifetime record of won games
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Games counted (wins)
    pub games_played: u32,
    /// Mistakes made in each counted game, oldest first
    pub mistakes_per_game: Vec<u8>,
}

impl Stats {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a finished game with the given number of mistakes made
    pub fn record_win(&mut self, mistakes_made: u8) {
        self.games_played += 1;
        self.mistakes_per_game.push(mistakes_made);
    }

    pub fn is_empty(&self) -> bool {
        self.games_played == 0
    }

    /// Mean mistakes per recorded game
    pub fn average_mistakes(&self) -> Option<f64> {
        if self.mistakes_per_game.is_empty() {
            return None;
        }
        let total: u32 = self.mistakes_per_game.iter().map(|&m| m as u32).sum();
        Some(total as f64 / self.mistakes_per_game.len() as f64)
    }

    /// Games won without a single mistake
    pub fn perfect_games(&self) -> usize {
        self.mistakes_per_game.iter().filter(|&&m| m == 0).count()
    }

    /// How many games finished with 0, 1, 2 and 3 mistakes
    pub fn distribution(&self) -> [u32; MAX_MISTAKES as usize] {
        let mut counts = [0; MAX_MISTAKES as usize];
        for &m in &self.mistakes_per_game {
            // A win always leaves at least one mistake in hand
            if let Some(slot) = counts.get_mut(m as usize) {
                *slot += 1;
            }
        }
        counts
    }
}
