//! Notifications for the rendering layer

use serde::Serialize;

use super::state::{Outcome, SolvedGroup};
use crate::puzzle::GroupKey;

/// A state change the renderer should reflect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    SelectionChanged { selected: Vec<String> },
    /// Pool contents or order changed
    PoolChanged { pool: Vec<String> },
    MistakesChanged { remaining: u8 },
    GroupSolved { key: GroupKey, group: SolvedGroup },
    OutcomeChanged { outcome: Outcome },
    /// State was replaced (reset or resume); the renderer should drop what it drew
    /// and redraw from the events that follow
    Restarted,
    /// A save or load failed; play continues from memory
    PersistenceFailed { message: String },
}
