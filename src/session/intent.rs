//! User intents from the rendering layer

use serde::Deserialize;

use super::Session;
use crate::persistence::Storage;

/// A single user action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    Select { word: String },
    Deselect { word: String },
    /// Click on a word tile
    Toggle { word: String },
    DeselectAll,
    Submit,
    Shuffle,
    /// Clear saved progress and start over
    Reset,
}

impl<S: Storage> Session<S> {
    /// Process one intent to completion
    pub fn handle(&mut self, intent: Intent) {
        match intent {
            Intent::Select { word } => self.select(&word),
            Intent::Deselect { word } => self.deselect(&word),
            Intent::Toggle { word } => self.toggle(&word),
            Intent::DeselectAll => self.deselect_all(),
            Intent::Submit => {
                self.submit_guess();
            }
            Intent::Shuffle => self.shuffle(true),
            Intent::Reset => self.reset(),
        }
    }
}
