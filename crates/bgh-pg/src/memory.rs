use super::HistoryError;
use super::HistoryStore;
use async_trait::async_trait;
use bgh_game::Round;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// In-process history store for tests.
///
/// Rows are whole round snapshots in insertion order. `set_failing`
/// makes writes fail, for finalize partial-failure coverage.
#[derive(Default)]
pub struct MemoryHistory {
    rows: Mutex<Vec<Round>>,
    failing: AtomicBool,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
    /// Snapshot of recorded rounds, oldest first.
    pub fn rows(&self) -> Vec<Round> {
        self.rows.lock().expect("rows poisoned").clone()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn save_game_history(&self, round: &Round) -> Result<(), HistoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(HistoryError("injected failure".to_string()));
        }
        self.rows.lock().expect("rows poisoned").push(round.clone());
        Ok(())
    }
    async fn total_games_count(&self) -> Result<i64, HistoryError> {
        Ok(self.rows.lock().expect("rows poisoned").len() as i64)
    }
    async fn cancelled_games_count(&self) -> Result<i64, HistoryError> {
        Ok(self
            .rows
            .lock()
            .expect("rows poisoned")
            .iter()
            .filter(|r| r.is_cancelled())
            .count() as i64)
    }
}
