//! Day-scoped session snapshot record

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::puzzle::GroupKey;
use crate::session::{Outcome, SolvedGroup};

/// Persisted session progress, valid only on `last_played`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Position of the puzzle in the source (older records omit it)
    #[serde(default)]
    pub puzzle_number: Option<u32>,
    /// Mistakes remaining
    pub mistakes: u8,
    pub solved_groups: BTreeMap<GroupKey, SolvedGroup>,
    /// Solve order, for display and win detection
    pub solved_group_order: Vec<GroupKey>,
    /// Local calendar date the snapshot was written (`YYYY-MM-DD`)
    pub last_played: NaiveDate,
    pub game_state: Outcome,
}
