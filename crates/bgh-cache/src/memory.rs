use super::LUCKY_KEY;
use super::LiveStore;
use super::StoreError;
use super::game_key;
use async_trait::async_trait;
use bgh_core::RoomId;
use bgh_game::LuckyRoster;
use bgh_game::Round;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// In-process live store.
///
/// Values go through the same JSON mirror as the Redis store, so tests
/// exercise the real persist/reload path. `set_failing` makes every write
/// fail, for rollback coverage.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    /// While set, every write returns `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LiveStore for MemoryStore {
    async fn save_game(&self, round: &Round) -> Result<(), StoreError> {
        self.check()?;
        let json = serde_json::to_string(round)?;
        self.slots
            .lock()
            .expect("slots poisoned")
            .insert(game_key(round.room()), json);
        Ok(())
    }
    async fn current_game(&self, room: &RoomId) -> Result<Option<Round>, StoreError> {
        let slots = self.slots.lock().expect("slots poisoned");
        match slots.get(&game_key(room)) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }
    async fn delete_current_game(&self, room: &RoomId) -> Result<(), StoreError> {
        self.check()?;
        self.slots
            .lock()
            .expect("slots poisoned")
            .remove(&game_key(room));
        Ok(())
    }
    async fn lucky_balls(&self) -> Result<Option<LuckyRoster>, StoreError> {
        let slots = self.slots.lock().expect("slots poisoned");
        match slots.get(LUCKY_KEY) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }
    async fn save_lucky_balls(&self, roster: &LuckyRoster) -> Result<(), StoreError> {
        self.check()?;
        let json = serde_json::to_string(roster)?;
        self.slots
            .lock()
            .expect("slots poisoned")
            .insert(LUCKY_KEY.to_string(), json);
        Ok(())
    }
}
