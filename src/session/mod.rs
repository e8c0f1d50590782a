//! Puzzle session
//!
//! Drives the selection/guess state machine for one puzzle. This module is
//! deterministic given a seed:
//! - Guess results are computed immediately from the selection
//! - Shuffles use a seeded RNG only
//! - Every state change is recorded as a `SessionEvent` for the renderer
//! - Storage failures are logged and reported, never fatal

pub mod events;
pub mod intent;
pub mod state;

pub use events::SessionEvent;
pub use intent::Intent;
pub use state::{GuessResult, Outcome, SessionState, SolvedGroup};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::persistence::{GameStorage, Snapshot, Storage, StorageError};
use crate::puzzle::{Group, GroupKey, Puzzle};

/// The first (and only) puzzle in the source
const ACTIVE_PUZZLE_NUMBER: u32 = 1;

/// One player's session over one puzzle
pub struct Session<S: Storage> {
    puzzle: Puzzle,
    puzzle_number: u32,
    state: SessionState,
    storage: GameStorage<S>,
    rng: Pcg32,
    events: Vec<SessionEvent>,
}

impl<S: Storage> Session<S> {
    /// Start a session, resuming today's snapshot when one is stored
    pub fn start(puzzle: Puzzle, storage: GameStorage<S>, seed: u64) -> Self {
        let mut session = Self {
            state: SessionState::fresh(&puzzle),
            puzzle,
            puzzle_number: ACTIVE_PUZZLE_NUMBER,
            storage,
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        };

        log::info!(
            "Session started for puzzle {} with seed: {}",
            session.puzzle.date,
            seed
        );

        let snapshot = match session.storage.load_state() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                session.report("load saved progress", e);
                None
            }
        };
        session.resume(snapshot);
        session
    }

    /// Restore from a snapshot dated today, otherwise start fresh.
    /// The renderer is told to drop whatever it drew before.
    pub fn resume(&mut self, snapshot: Option<Snapshot>) {
        self.events.push(SessionEvent::Restarted);
        let today = self.storage.today();
        let restored = snapshot.and_then(|snapshot| {
            if snapshot.last_played != today {
                log::info!("Ignoring snapshot from {}", snapshot.last_played);
                return None;
            }
            let state = SessionState::from_snapshot(&self.puzzle, &snapshot);
            if state.is_none() {
                log::warn!("Snapshot does not match puzzle {}, starting fresh", self.puzzle.date);
            }
            state.map(|state| (state, snapshot.puzzle_number))
        });

        match restored {
            Some((state, puzzle_number)) => {
                log::info!(
                    "Resumed: {} solved, {} mistakes left, {}",
                    state.solved_group_order().len(),
                    state.mistakes_remaining(),
                    state.outcome().as_str()
                );
                self.state = state;
                self.puzzle_number = puzzle_number.unwrap_or(ACTIVE_PUZZLE_NUMBER);
            }
            None => {
                self.state = SessionState::fresh(&self.puzzle);
                self.puzzle_number = ACTIVE_PUZZLE_NUMBER;
            }
        }

        if self.state.is_playing() {
            self.state.shuffle_pool(&mut self.rng);
        }
        self.announce_state();
    }

    /// Emit the whole state, for a renderer that has just attached
    fn announce_state(&mut self) {
        for key in self.state.solved_group_order().to_vec() {
            if let Some(group) = self.state.solved_groups().get(&key) {
                self.events.push(SessionEvent::GroupSolved {
                    key,
                    group: group.clone(),
                });
            }
        }
        self.events.push(SessionEvent::MistakesChanged {
            remaining: self.state.mistakes_remaining(),
        });
        self.events.push(SessionEvent::PoolChanged {
            pool: self.state.pool().to_vec(),
        });
        self.events.push(SessionEvent::OutcomeChanged {
            outcome: self.state.outcome(),
        });
    }

    pub fn select(&mut self, word: &str) {
        if self.state.select(word) {
            self.selection_changed();
        }
    }

    pub fn deselect(&mut self, word: &str) {
        if self.state.deselect(word) {
            self.selection_changed();
        }
    }

    pub fn toggle(&mut self, word: &str) {
        if self.state.toggle(word) {
            self.selection_changed();
        }
    }

    pub fn deselect_all(&mut self) {
        if self.state.clear_selection() {
            self.selection_changed();
        }
    }

    fn selection_changed(&mut self) {
        self.events.push(SessionEvent::SelectionChanged {
            selected: self.state.selected().to_vec(),
        });
    }

    /// Judge the selection. Requires exactly four selected words.
    pub fn submit_guess(&mut self) -> GuessResult {
        let result = self.state.submit(&self.puzzle);

        match result {
            GuessResult::Rejected => return result,
            GuessResult::Correct(key) => {
                log::info!("Solved {} ({} of 4)", key.as_str(), self.state.solved_group_order().len());
                if let Some(group) = self.state.solved_groups().get(&key) {
                    self.events.push(SessionEvent::GroupSolved {
                        key,
                        group: group.clone(),
                    });
                }
                self.selection_changed();
                self.events.push(SessionEvent::PoolChanged {
                    pool: self.state.pool().to_vec(),
                });
            }
            GuessResult::Incorrect { mistakes_remaining } => {
                log::info!("Wrong guess, {mistakes_remaining} mistakes left");
                self.events.push(SessionEvent::MistakesChanged {
                    remaining: mistakes_remaining,
                });
                self.selection_changed();
            }
        }

        if self.state.outcome().is_terminal() {
            self.events.push(SessionEvent::OutcomeChanged {
                outcome: self.state.outcome(),
            });
            self.end_game();
        } else {
            self.persist();
        }

        result
    }

    /// Shuffle the pool; `deselect` also clears the selection
    pub fn shuffle(&mut self, deselect: bool) {
        if !self.state.is_playing() {
            return;
        }
        if deselect {
            self.deselect_all();
        }
        self.state.shuffle_pool(&mut self.rng);
        self.events.push(SessionEvent::PoolChanged {
            pool: self.state.pool().to_vec(),
        });
    }

    /// Forget saved progress and start the puzzle over
    pub fn reset(&mut self) {
        if let Err(e) = self.storage.reset_state() {
            self.report("clear saved progress", e);
        }
        self.events.push(SessionEvent::Restarted);
        self.state = SessionState::fresh(&self.puzzle);
        self.puzzle_number = ACTIVE_PUZZLE_NUMBER;
        self.state.shuffle_pool(&mut self.rng);
        self.announce_state();
    }

    /// Final save once the outcome leaves `Playing`; wins also count in stats
    fn end_game(&mut self) {
        log::info!(
            "Game over: {} with {} mistakes",
            self.state.outcome().as_str(),
            self.state.mistakes_made()
        );
        self.persist();

        if self.state.outcome() != Outcome::Won {
            return;
        }

        let result = self.storage.load_stats().and_then(|mut stats| {
            stats.record_win(self.state.mistakes_made());
            self.storage.save_stats(&stats)
        });
        if let Err(e) = result {
            self.report("update stats", e);
        }
    }

    fn persist(&mut self) {
        let snapshot = self
            .state
            .to_snapshot(self.storage.today(), self.puzzle_number);
        if let Err(e) = self.storage.save_state(&snapshot) {
            self.report("save progress", e);
        }
    }

    fn report(&mut self, action: &str, error: StorageError) {
        log::warn!("Failed to {action}: {error}");
        self.events.push(SessionEvent::PersistenceFailed {
            message: format!("failed to {action}: {error}"),
        });
    }

    /// Drain notifications recorded since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn puzzle_number(&self) -> u32 {
        self.puzzle_number
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn storage(&self) -> &GameStorage<S> {
        &self.storage
    }

    pub fn pool(&self) -> &[String] {
        self.state.pool()
    }

    pub fn selected(&self) -> &[String] {
        self.state.selected()
    }

    pub fn mistakes_remaining(&self) -> u8 {
        self.state.mistakes_remaining()
    }

    pub fn mistakes_made(&self) -> u8 {
        self.state.mistakes_made()
    }

    pub fn outcome(&self) -> Outcome {
        self.state.outcome()
    }

    /// Solved groups in the order they were found
    pub fn solved_groups(&self) -> Vec<(GroupKey, &SolvedGroup)> {
        self.state
            .solved_group_order()
            .iter()
            .filter_map(|key| self.state.solved_groups().get(key).map(|g| (*key, g)))
            .collect()
    }

    /// Solved groups, easiest first (end screens)
    pub fn solved_groups_by_level(&self) -> Vec<(GroupKey, &SolvedGroup)> {
        let mut keys = self.state.solved_group_order().to_vec();
        self.puzzle.sort_by_level(&mut keys);
        keys.into_iter()
            .filter_map(|key| self.state.solved_groups().get(&key).map(|g| (key, g)))
            .collect()
    }

    /// Every group, easiest first. Only revealed once the game is over.
    pub fn solution(&self) -> Option<Vec<(GroupKey, &Group)>> {
        if !self.state.outcome().is_terminal() {
            return None;
        }
        Some(
            self.puzzle
                .keys_by_level()
                .into_iter()
                .filter_map(|key| self.puzzle.group(key).map(|g| (key, g)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{STATE_KEY, STATS_KEY};
    use crate::persistence::{FixedClock, MemoryStorage};
    use crate::puzzle::{PuzzleCollection, TEST_PUZZLES};
    use crate::stats::Stats;
    use chrono::NaiveDate;

    fn puzzle() -> Puzzle {
        PuzzleCollection::from_json(TEST_PUZZLES)
            .unwrap()
            .into_first()
            .unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn start(backend: MemoryStorage, clock: FixedClock) -> Session<MemoryStorage> {
        Session::start(puzzle(), GameStorage::with_clock(backend, clock), 42)
    }

    fn guess(session: &mut Session<MemoryStorage>, words: &[&str]) -> GuessResult {
        for w in words {
            session.select(w);
        }
        session.submit_guess()
    }

    const YELLOW: [&str; 4] = ["JOYFUL", "GLAD", "CHEERFUL", "MERRY"];
    const GREEN: [&str; 4] = ["BASS", "SOLE", "PIKE", "CARP"];
    const BLUE: [&str; 4] = ["MARS", "VENUS", "EARTH", "SATURN"];
    const PURPLE: [&str; 4] = ["FOOT", "BASKET", "SNOW", "HAND"];
    const WRONG: [&str; 4] = ["JOYFUL", "GLAD", "MARS", "FOOT"];

    /// Failing backend for degraded-persistence tests
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".to_string()))
        }
    }

    #[test]
    fn test_fresh_start() {
        let mut session = start(MemoryStorage::new(), FixedClock::new(day(1)));
        assert_eq!(session.pool().len(), 16);
        assert_eq!(session.mistakes_remaining(), 4);
        assert_eq!(session.outcome(), Outcome::Playing);
        assert_eq!(session.puzzle_number(), 1);

        let events = session.take_events();
        assert_eq!(events.first(), Some(&SessionEvent::Restarted));
        assert!(events.contains(&SessionEvent::MistakesChanged { remaining: 4 }));
        let pools: Vec<&SessionEvent> = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::PoolChanged { .. }))
            .collect();
        assert_eq!(
            pools,
            [&SessionEvent::PoolChanged {
                pool: session.pool().to_vec()
            }]
        );
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn test_correct_guess_persists() {
        let backend = MemoryStorage::new();
        let mut session = start(backend.clone(), FixedClock::new(day(1)));

        assert_eq!(guess(&mut session, &YELLOW), GuessResult::Correct(GroupKey::Yellow));
        assert_eq!(session.pool().len(), 12);
        assert_eq!(session.mistakes_remaining(), 4);

        let saved = backend.get(STATE_KEY).unwrap().expect("snapshot written");
        let snapshot: Snapshot = serde_json::from_str(&saved).unwrap();
        assert_eq!(snapshot.solved_group_order, vec![GroupKey::Yellow]);
        assert_eq!(snapshot.mistakes, 4);
        assert_eq!(snapshot.last_played, day(1));
        assert_eq!(snapshot.puzzle_number, Some(1));
    }

    #[test]
    fn test_wrong_guess_events() {
        let mut session = start(MemoryStorage::new(), FixedClock::new(day(1)));
        session.take_events();

        assert_eq!(
            guess(&mut session, &WRONG),
            GuessResult::Incorrect {
                mistakes_remaining: 3
            }
        );
        let events = session.take_events();
        assert!(events.contains(&SessionEvent::MistakesChanged { remaining: 3 }));
        assert_eq!(
            events.last(),
            Some(&SessionEvent::SelectionChanged { selected: vec![] })
        );
        assert_eq!(session.pool().len(), 16);
    }

    #[test]
    fn test_rejected_submit_is_noop() {
        let backend = MemoryStorage::new();
        let mut session = start(backend.clone(), FixedClock::new(day(1)));
        session.select("JOYFUL");
        session.take_events();

        assert_eq!(session.submit_guess(), GuessResult::Rejected);
        assert_eq!(session.submit_guess(), GuessResult::Rejected);
        assert_eq!(session.mistakes_remaining(), 4);
        assert!(session.take_events().is_empty());
        assert_eq!(backend.get(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_loss() {
        let backend = MemoryStorage::new();
        let mut session = start(backend.clone(), FixedClock::new(day(1)));
        for _ in 0..4 {
            guess(&mut session, &WRONG);
        }
        assert_eq!(session.outcome(), Outcome::Lost);
        assert_eq!(session.mistakes_remaining(), 0);

        // A fifth attempt changes nothing
        session.take_events();
        assert_eq!(guess(&mut session, &WRONG), GuessResult::Rejected);
        assert!(session.take_events().is_empty());
        session.shuffle(true);
        assert!(session.take_events().is_empty());

        let snapshot: Snapshot =
            serde_json::from_str(&backend.get(STATE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(snapshot.game_state, Outcome::Lost);
        // Losses do not count in stats
        assert_eq!(backend.get(STATS_KEY).unwrap(), None);

        let solution = session.solution().unwrap();
        assert_eq!(solution.len(), 4);
        assert_eq!(solution[0].0, GroupKey::Yellow);
    }

    #[test]
    fn test_win_updates_stats() {
        let backend = MemoryStorage::new();
        let clock = FixedClock::new(day(1));
        let mut session = start(backend.clone(), clock.clone());

        guess(&mut session, &PURPLE);
        guess(&mut session, &["JOYFUL", "GLAD", "BASS", "MARS"]);
        guess(&mut session, &BLUE);
        guess(&mut session, &GREEN);
        assert_eq!(session.outcome(), Outcome::Playing);
        assert!(session.solution().is_none());
        session.take_events();

        assert_eq!(guess(&mut session, &YELLOW), GuessResult::Correct(GroupKey::Yellow));
        assert_eq!(session.outcome(), Outcome::Won);
        assert!(session
            .take_events()
            .contains(&SessionEvent::OutcomeChanged { outcome: Outcome::Won }));

        let stats: Stats = serde_json::from_str(&backend.get(STATS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.mistakes_per_game, vec![1]);

        let order: Vec<GroupKey> = session.solved_groups().iter().map(|(k, _)| *k).collect();
        assert_eq!(
            order,
            vec![GroupKey::Purple, GroupKey::Blue, GroupKey::Green, GroupKey::Yellow]
        );
        let by_level: Vec<GroupKey> =
            session.solved_groups_by_level().iter().map(|(k, _)| *k).collect();
        assert_eq!(by_level, GroupKey::ALL.to_vec());

        // Reloading a won game the same day does not count it twice
        let resumed = start(backend.clone(), clock);
        assert_eq!(resumed.outcome(), Outcome::Won);
        let stats: Stats = serde_json::from_str(&backend.get(STATS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stats.games_played, 1);
    }

    #[test]
    fn test_resume_same_day() {
        let backend = MemoryStorage::new();
        let clock = FixedClock::new(day(1));
        let mut session = start(backend.clone(), clock.clone());
        assert_eq!(guess(&mut session, &GREEN), GuessResult::Correct(GroupKey::Green));
        assert_eq!(
            guess(&mut session, &WRONG),
            GuessResult::Incorrect {
                mistakes_remaining: 3
            }
        );

        let resumed = start(backend.clone(), clock);
        assert_eq!(resumed.state().solved_groups(), session.state().solved_groups());
        assert_eq!(resumed.state().solved_group_order(), [GroupKey::Green]);
        assert_eq!(resumed.mistakes_remaining(), 3);
        assert_eq!(resumed.outcome(), Outcome::Playing);
        assert_eq!(resumed.pool().len(), 12);
    }

    #[test]
    fn test_resume_next_day_starts_fresh() {
        let backend = MemoryStorage::new();
        let clock = FixedClock::new(day(1));
        let mut session = start(backend.clone(), clock.clone());
        assert_eq!(guess(&mut session, &GREEN), GuessResult::Correct(GroupKey::Green));
        assert_eq!(
            guess(&mut session, &WRONG),
            GuessResult::Incorrect {
                mistakes_remaining: 3
            }
        );
        assert!(backend.get(STATE_KEY).unwrap().is_some());

        clock.set(day(2));
        let resumed = start(backend.clone(), clock);
        assert_eq!(resumed.pool().len(), 16);
        assert_eq!(resumed.mistakes_remaining(), 4);
        assert!(resumed.state().solved_groups().is_empty());
        assert_eq!(backend.get(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_resume_ignores_stale_snapshot() {
        let mut session = start(MemoryStorage::new(), FixedClock::new(day(2)));
        let stale = SessionState::fresh(session.puzzle()).to_snapshot(day(1), 1);
        guess(&mut session, &GREEN);
        session.take_events();

        session.resume(Some(stale));
        assert_eq!(session.pool().len(), 16);
        assert!(session.solved_groups().is_empty());

        // The board drawn so far (with GREEN solved) must be discarded
        let events = session.take_events();
        assert_eq!(events.first(), Some(&SessionEvent::Restarted));
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::GroupSolved { .. })));

        guess(&mut session, &GREEN);
        session.take_events();
        session.resume(None);
        assert_eq!(session.take_events().first(), Some(&SessionEvent::Restarted));
        assert!(session.solved_groups().is_empty());
    }

    #[test]
    fn test_resume_announces_pool_once() {
        let backend = MemoryStorage::new();
        let clock = FixedClock::new(day(1));
        let mut session = start(backend.clone(), clock.clone());
        guess(&mut session, &BLUE);

        let mut resumed = start(backend, clock);
        let events = resumed.take_events();
        let pools = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::PoolChanged { .. }))
            .count();
        assert_eq!(pools, 1);
        assert_eq!(
            events.last(),
            Some(&SessionEvent::OutcomeChanged {
                outcome: Outcome::Playing
            })
        );
        assert!(events.contains(&SessionEvent::PoolChanged {
            pool: resumed.pool().to_vec()
        }));
    }

    #[test]
    fn test_shuffle_clears_selection() {
        let mut session = start(MemoryStorage::new(), FixedClock::new(day(1)));
        session.select("GLAD");
        session.shuffle(false);
        assert_eq!(session.selected(), ["GLAD"]);

        session.shuffle(true);
        assert!(session.selected().is_empty());
        assert_eq!(session.pool().len(), 16);
    }

    #[test]
    fn test_same_seed_same_board() {
        let a = start(MemoryStorage::new(), FixedClock::new(day(1)));
        let b = start(MemoryStorage::new(), FixedClock::new(day(1)));
        assert_eq!(a.pool(), b.pool());
    }

    #[test]
    fn test_reset() {
        let backend = MemoryStorage::new();
        let mut session = start(backend.clone(), FixedClock::new(day(1)));
        for _ in 0..4 {
            guess(&mut session, &WRONG);
        }
        assert_eq!(session.outcome(), Outcome::Lost);

        session.reset();
        assert_eq!(session.outcome(), Outcome::Playing);
        assert_eq!(session.mistakes_remaining(), 4);
        assert_eq!(session.pool().len(), 16);
        assert_eq!(backend.get(STATE_KEY).unwrap(), None);
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let storage = GameStorage::with_clock(BrokenStorage, FixedClock::new(day(1)));
        let mut session = Session::start(puzzle(), storage, 3);
        assert!(session
            .take_events()
            .iter()
            .any(|e| matches!(e, SessionEvent::PersistenceFailed { .. })));

        for words in [YELLOW, GREEN, BLUE] {
            for w in words {
                session.select(w);
            }
            assert!(matches!(session.submit_guess(), GuessResult::Correct(_)));
        }
        for w in PURPLE {
            session.select(w);
        }
        session.submit_guess();
        assert_eq!(session.outcome(), Outcome::Won);

        let failures = session
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::PersistenceFailed { .. }))
            .count();
        // Snapshot per guess plus the stats update
        assert_eq!(failures, 5);
    }

    #[test]
    fn test_unreadable_stats_are_kept() {
        let mut backend = MemoryStorage::new();
        backend.set(STATS_KEY, "garbage").unwrap();
        let mut session = start(backend.clone(), FixedClock::new(day(1)));
        session.take_events();

        for words in [YELLOW, GREEN, BLUE, PURPLE] {
            assert!(matches!(guess(&mut session, &words), GuessResult::Correct(_)));
        }
        assert_eq!(session.outcome(), Outcome::Won);

        let failures = session
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::PersistenceFailed { .. }))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(backend.get(STATS_KEY).unwrap().as_deref(), Some("garbage"));

        // The final snapshot is still written
        let snapshot: Snapshot =
            serde_json::from_str(&backend.get(STATE_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(snapshot.game_state, Outcome::Won);
    }
}
