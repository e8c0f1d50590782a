//! Puzzle data and source validation
//!
//! A puzzle is four groups of four words, keyed by colour. The source is a
//! JSON document holding a list of puzzles; only the first one is played.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{GROUP_COUNT, GROUP_SIZE, WORD_COUNT};

/// Group colour (fixed set, also the difficulty palette)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    Yellow,
    Green,
    Blue,
    Purple,
}

impl GroupKey {
    pub const ALL: [GroupKey; GROUP_COUNT] = [
        GroupKey::Yellow,
        GroupKey::Green,
        GroupKey::Blue,
        GroupKey::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Yellow => "yellow",
            GroupKey::Green => "green",
            GroupKey::Blue => "blue",
            GroupKey::Purple => "purple",
        }
    }
}

/// A themed set of words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Difficulty (1 = easiest), used for display ordering
    pub level: u8,
    pub description: String,
    pub words: Vec<String>,
}

impl Group {
    /// Set equality between the selection and this group's words
    pub fn matches(&self, selection: &[String]) -> bool {
        selection.len() == self.words.len() && selection.iter().all(|w| self.words.contains(w))
    }
}

/// A single day's puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    /// Puzzle identifier (its publication date)
    pub date: String,
    pub groups: BTreeMap<GroupKey, Group>,
}

impl Puzzle {
    /// Check the shape rules: four groups, four words each, every word unique,
    /// levels 1-4 used once each.
    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.groups.len() != GROUP_COUNT {
            return Err(PuzzleError::GroupCount {
                date: self.date.clone(),
                found: self.groups.len(),
            });
        }

        let mut seen_words = HashSet::with_capacity(WORD_COUNT);
        let mut seen_levels = HashSet::with_capacity(GROUP_COUNT);

        for (key, group) in &self.groups {
            if group.words.len() != GROUP_SIZE {
                return Err(PuzzleError::WordCount {
                    date: self.date.clone(),
                    key: *key,
                    found: group.words.len(),
                });
            }

            if !(1..=GROUP_COUNT as u8).contains(&group.level) {
                return Err(PuzzleError::InvalidLevel {
                    date: self.date.clone(),
                    key: *key,
                    level: group.level,
                });
            }

            if !seen_levels.insert(group.level) {
                return Err(PuzzleError::DuplicateLevel {
                    date: self.date.clone(),
                    level: group.level,
                });
            }

            for word in &group.words {
                if !seen_words.insert(word.as_str()) {
                    return Err(PuzzleError::DuplicateWord {
                        date: self.date.clone(),
                        word: word.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn group(&self, key: GroupKey) -> Option<&Group> {
        self.groups.get(&key)
    }

    /// Every word on the board, group by group
    pub fn words(&self) -> Vec<String> {
        self.groups
            .values()
            .flat_map(|g| g.words.iter().cloned())
            .collect()
    }

    /// The group whose words are exactly the selection, if any
    pub fn find_group(&self, selection: &[String]) -> Option<GroupKey> {
        self.groups
            .iter()
            .find(|(_, group)| group.matches(selection))
            .map(|(key, _)| *key)
    }

    /// Sort group keys by difficulty level (easiest first)
    pub fn sort_by_level(&self, keys: &mut [GroupKey]) {
        keys.sort_by_key(|k| self.groups.get(k).map(|g| g.level).unwrap_or(u8::MAX));
    }

    /// All group keys, easiest first
    pub fn keys_by_level(&self) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = self.groups.keys().copied().collect();
        self.sort_by_level(&mut keys);
        keys
    }
}

/// The puzzle source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleCollection {
    pub puzzles: Vec<Puzzle>,
}

impl PuzzleCollection {
    /// Parse and validate a puzzle source
    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        let collection: PuzzleCollection = serde_json::from_str(json)?;
        if collection.puzzles.is_empty() {
            return Err(PuzzleError::Empty);
        }
        for puzzle in &collection.puzzles {
            puzzle.validate()?;
        }
        log::info!("Loaded {} puzzle(s)", collection.puzzles.len());
        Ok(collection)
    }

    /// Read and validate a puzzle source file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, PuzzleError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The active puzzle (always the first)
    pub fn into_first(self) -> Result<Puzzle, PuzzleError> {
        self.puzzles.into_iter().next().ok_or(PuzzleError::Empty)
    }
}

/// Reasons a puzzle source cannot start a session
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("failed to read puzzle source: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed puzzle source: {0}")]
    Json(#[from] serde_json::Error),
    #[error("puzzle source contains no puzzles")]
    Empty,
    #[error("puzzle {date}: expected {} groups, found {found}", GROUP_COUNT)]
    GroupCount { date: String, found: usize },
    #[error("puzzle {date}: group {} has {found} words, expected {}", .key.as_str(), GROUP_SIZE)]
    WordCount {
        date: String,
        key: GroupKey,
        found: usize,
    },
    #[error("puzzle {date}: word {word:?} appears more than once")]
    DuplicateWord { date: String, word: String },
    #[error("puzzle {date}: group {} has invalid level {level}", .key.as_str())]
    InvalidLevel {
        date: String,
        key: GroupKey,
        level: u8,
    },
    #[error("puzzle {date}: level {level} used by more than one group")]
    DuplicateLevel { date: String, level: u8 },
}

/// Sample puzzle used by tests
#[cfg(test)]
pub(crate) const TEST_PUZZLES: &str = r#"{
    "puzzles": [
        {
            "date": "2024-06-01",
            "groups": {
                "yellow": { "level": 1, "description": "HAPPY", "words": ["JOYFUL", "GLAD", "CHEERFUL", "MERRY"] },
                "green": { "level": 2, "description": "FISH", "words": ["BASS", "SOLE", "PIKE", "CARP"] },
                "blue": { "level": 3, "description": "PLANETS", "words": ["MARS", "VENUS", "EARTH", "SATURN"] },
                "purple": { "level": 4, "description": "___BALL", "words": ["FOOT", "BASKET", "SNOW", "HAND"] }
            }
        }
    ]
}"#;
