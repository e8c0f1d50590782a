//! Session state and its pure transitions
//!
//! Nothing here touches storage or emits notifications; `Session` wraps this
//! and handles both.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::consts::{GROUP_COUNT, GROUP_SIZE, MAX_MISTAKES};
use crate::persistence::Snapshot;
use crate::puzzle::{GroupKey, Puzzle};

/// Game outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    #[default]
    Playing,
    Won,
    Lost,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Playing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Playing => "playing",
            Outcome::Won => "won",
            Outcome::Lost => "lost",
        }
    }
}

/// A group as captured when it was solved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolvedGroup {
    pub description: String,
    pub words: Vec<String>,
}

/// Result of a guess submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessResult {
    /// Not exactly four words selected, or the game is over
    Rejected,
    Correct(GroupKey),
    Incorrect { mistakes_remaining: u8 },
}

/// Complete session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Unsolved words, in display order
    pool: Vec<String>,
    /// Selected words, in selection order (always a subset of `pool`)
    selected: Vec<String>,
    mistakes_remaining: u8,
    solved_groups: BTreeMap<GroupKey, SolvedGroup>,
    solved_group_order: Vec<GroupKey>,
    outcome: Outcome,
}

impl SessionState {
    /// Full board, nothing solved
    pub fn fresh(puzzle: &Puzzle) -> Self {
        Self {
            pool: puzzle.words(),
            selected: Vec::with_capacity(GROUP_SIZE),
            mistakes_remaining: MAX_MISTAKES,
            solved_groups: BTreeMap::new(),
            solved_group_order: Vec::with_capacity(GROUP_COUNT),
            outcome: Outcome::Playing,
        }
    }

    /// Rebuild state from a snapshot of this puzzle. Returns `None` when the
    /// snapshot does not describe a reachable state of `puzzle`.
    pub fn from_snapshot(puzzle: &Puzzle, snapshot: &Snapshot) -> Option<Self> {
        if snapshot.mistakes > MAX_MISTAKES {
            return None;
        }

        let order = &snapshot.solved_group_order;
        if order.len() != snapshot.solved_groups.len() || order.len() > GROUP_COUNT {
            return None;
        }
        for (i, key) in order.iter().enumerate() {
            if order[..i].contains(key) {
                return None;
            }
            let solved = snapshot.solved_groups.get(key)?;
            if !puzzle.group(*key)?.matches(&solved.words) {
                return None;
            }
        }

        let expected = if order.len() == GROUP_COUNT {
            Outcome::Won
        } else if snapshot.mistakes == 0 {
            Outcome::Lost
        } else {
            Outcome::Playing
        };
        if snapshot.game_state != expected {
            return None;
        }

        let pool = puzzle
            .words()
            .into_iter()
            .filter(|w| !snapshot.solved_groups.values().any(|g| g.words.contains(w)))
            .collect();

        Some(Self {
            pool,
            selected: Vec::with_capacity(GROUP_SIZE),
            mistakes_remaining: snapshot.mistakes,
            solved_groups: snapshot.solved_groups.clone(),
            solved_group_order: order.clone(),
            outcome: snapshot.game_state,
        })
    }

    pub fn to_snapshot(&self, last_played: NaiveDate, puzzle_number: u32) -> Snapshot {
        Snapshot {
            puzzle_number: Some(puzzle_number),
            mistakes: self.mistakes_remaining,
            solved_groups: self.solved_groups.clone(),
            solved_group_order: self.solved_group_order.clone(),
            last_played,
            game_state: self.outcome,
        }
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn mistakes_remaining(&self) -> u8 {
        self.mistakes_remaining
    }

    pub fn mistakes_made(&self) -> u8 {
        MAX_MISTAKES - self.mistakes_remaining
    }

    pub fn solved_groups(&self) -> &BTreeMap<GroupKey, SolvedGroup> {
        &self.solved_groups
    }

    pub fn solved_group_order(&self) -> &[GroupKey] {
        &self.solved_group_order
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_playing(&self) -> bool {
        self.outcome == Outcome::Playing
    }

    pub fn is_selected(&self, word: &str) -> bool {
        self.selected.iter().any(|w| w == word)
    }

    fn in_pool(&self, word: &str) -> bool {
        self.pool.iter().any(|w| w == word)
    }

    /// Add a pool word to the selection. Returns true if the selection changed.
    pub fn select(&mut self, word: &str) -> bool {
        if !self.is_playing()
            || !self.in_pool(word)
            || self.is_selected(word)
            || self.selected.len() >= GROUP_SIZE
        {
            return false;
        }
        self.selected.push(word.to_string());
        true
    }

    /// Remove a word from the selection. Returns true if the selection changed.
    pub fn deselect(&mut self, word: &str) -> bool {
        if !self.is_playing() {
            return false;
        }
        let before = self.selected.len();
        self.selected.retain(|w| w != word);
        self.selected.len() != before
    }

    pub fn toggle(&mut self, word: &str) -> bool {
        if self.is_selected(word) {
            self.deselect(word)
        } else {
            self.select(word)
        }
    }

    pub fn clear_selection(&mut self) -> bool {
        if !self.is_playing() || self.selected.is_empty() {
            return false;
        }
        self.selected.clear();
        true
    }

    /// Judge the current selection against the puzzle.
    pub fn submit(&mut self, puzzle: &Puzzle) -> GuessResult {
        if !self.is_playing() || self.selected.len() != GROUP_SIZE {
            return GuessResult::Rejected;
        }

        match puzzle.find_group(&self.selected) {
            Some(key) => {
                // Selection is a subset of the pool, so a matched group is never already solved
                let Some(group) = puzzle.group(key) else {
                    return GuessResult::Rejected;
                };
                self.solved_groups.insert(
                    key,
                    SolvedGroup {
                        description: group.description.clone(),
                        words: group.words.clone(),
                    },
                );
                self.solved_group_order.push(key);
                self.pool.retain(|w| !group.words.contains(w));
                self.selected.clear();

                if self.solved_group_order.len() == GROUP_COUNT {
                    self.outcome = Outcome::Won;
                }
                GuessResult::Correct(key)
            }
            None => {
                self.mistakes_remaining = self.mistakes_remaining.saturating_sub(1);
                self.selected.clear();

                if self.mistakes_remaining == 0 {
                    self.outcome = Outcome::Lost;
                }
                GuessResult::Incorrect {
                    mistakes_remaining: self.mistakes_remaining,
                }
            }
        }
    }

    /// Unbiased in-place shuffle of the pool
    pub fn shuffle_pool<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.pool.shuffle(rng);
    }
}
