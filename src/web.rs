//! Browser binding
//!
//! The page owns all rendering. It forwards user intents here and redraws
//! from the JSON events and state this returns.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::persistence::{GameStorage, LocalStorage};
use crate::puzzle::{GroupKey, PuzzleCollection};
use crate::session::{Intent, Outcome, Session};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"Logger already initialized".into());
    }
    log::info!("Connections starting...");
}

/// Everything the page needs to draw the board
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct View<'a> {
    puzzle_number: u32,
    pool: &'a [String],
    selected: &'a [String],
    mistakes_remaining: u8,
    solved_groups: Vec<SolvedView<'a>>,
    outcome: Outcome,
}

#[derive(Serialize)]
struct SolvedView<'a> {
    key: GroupKey,
    level: u8,
    description: &'a str,
    words: &'a [String],
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Session handle exported to JavaScript
#[wasm_bindgen]
pub struct WebSession {
    session: Session<LocalStorage>,
}

#[wasm_bindgen]
impl WebSession {
    /// Start from the puzzle source document. Fails when it cannot be used.
    #[wasm_bindgen(constructor)]
    pub fn new(puzzles_json: &str) -> Result<WebSession, JsValue> {
        let puzzle = PuzzleCollection::from_json(puzzles_json)
            .and_then(|c| c.into_first())
            .map_err(|e| to_js(format!("cannot start: {e}")))?;
        let storage = GameStorage::new(LocalStorage::open());
        let seed = js_sys::Date::now() as u64;
        Ok(WebSession {
            session: Session::start(puzzle, storage, seed),
        })
    }

    /// Apply an intent given as JSON, e.g. `{"type":"toggle","word":"GLAD"}`
    pub fn handle(&mut self, intent_json: &str) -> Result<(), JsValue> {
        let intent: Intent = serde_json::from_str(intent_json).map_err(to_js)?;
        self.session.handle(intent);
        Ok(())
    }

    pub fn toggle(&mut self, word: &str) {
        self.session.toggle(word);
    }

    pub fn submit(&mut self) {
        self.session.submit_guess();
    }

    pub fn shuffle(&mut self) {
        self.session.shuffle(true);
    }

    #[wasm_bindgen(js_name = deselectAll)]
    pub fn deselect_all(&mut self) {
        self.session.deselect_all();
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Pending notifications as a JSON array
    #[wasm_bindgen(js_name = takeEvents)]
    pub fn take_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.take_events()).map_err(to_js)
    }

    /// Current board as JSON
    pub fn state(&self) -> Result<String, JsValue> {
        let puzzle = self.session.puzzle();
        let solved_groups = self
            .session
            .solved_groups()
            .into_iter()
            .map(|(key, group)| SolvedView {
                key,
                level: puzzle.group(key).map(|g| g.level).unwrap_or(0),
                description: &group.description,
                words: &group.words,
            })
            .collect();

        let view = View {
            puzzle_number: self.session.puzzle_number(),
            pool: self.session.pool(),
            selected: self.session.selected(),
            mistakes_remaining: self.session.mistakes_remaining(),
            solved_groups,
            outcome: self.session.outcome(),
        };
        serde_json::to_string(&view).map_err(to_js)
    }

    /// All groups, easiest first, once the game is over (JSON or `null`)
    pub fn solution(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.solution()).map_err(to_js)
    }
}
