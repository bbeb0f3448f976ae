use super::*;
use bgh_cache::LiveStore;
use bgh_core::ID;
use bgh_core::RoomId;
use bgh_core::Unique;
use bgh_game::*;
use bgh_pg::HistoryStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;
use tokio::sync::RwLock as AsyncRwLock;

type Slot = Arc<AsyncRwLock<Round>>;

/// Orchestrator for the authoritative round state of a set of rooms.
///
/// All mutating operations serialize on the per-room write lock, held
/// across the persistence call; snapshots take the read side and return
/// clones. Fan-out runs after the originating write committed, before the
/// lock is released, so per-room event order equals commit order. The
/// follow-up advance triggered by a last ball or a jackpot winner is
/// spawned as an independent task that re-acquires the lock.
pub struct Manager {
    rooms: Vec<RoomId>,
    slots: RwLock<HashMap<RoomId, Slot>>,
    live: Arc<dyn LiveStore>,
    history: Arc<dyn HistoryStore>,
    timers: TimerSupervisor,
    sinks: Fanout,
    hub: Arc<Hub>,
}

impl Manager {
    pub fn new(
        rooms: Vec<RoomId>,
        live: Arc<dyn LiveStore>,
        history: Arc<dyn HistoryStore>,
        hub: Arc<Hub>,
        sinks: Fanout,
    ) -> Self {
        Self {
            rooms,
            slots: RwLock::new(HashMap::new()),
            live,
            history,
            timers: TimerSupervisor::new(),
            sinks,
            hub,
        }
    }
    pub fn rooms(&self) -> &[RoomId] {
        &self.rooms
    }
    fn slot(&self, room: &RoomId) -> Result<Slot, GameError> {
        self.slots
            .read()
            .expect("slots poisoned")
            .get(room)
            .cloned()
            .ok_or(GameError::GameNotFound)
    }

    /// Rebuild state from the persistent stores at boot.
    ///
    /// A cached in-flight round re-attaches its stage timer; an empty slot
    /// gets a fresh `Preparation` round; a terminal round found as current
    /// is trusted as-is and overwritten by the next create. The lucky
    /// roster is generated once when the store has none.
    pub async fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        if self.live.lucky_balls().await?.is_none() {
            let roster = LuckyRoster::generate(&mut rand::rng());
            self.live.save_lucky_balls(&roster).await?;
            log::info!("[manager] generated lucky roster {}", roster);
        }
        for room in self.rooms.clone() {
            let round = match self.live.current_game(&room).await? {
                Some(round) => {
                    log::info!(
                        "[room {}] recovered round {} in {}",
                        room,
                        round.id(),
                        round.stage()
                    );
                    if round.stage().is_terminal() {
                        log::warn!("[room {}] current slot holds a terminal round", room);
                    }
                    if let Some(timeout) = round.stage().spec().timeout {
                        self.install_timer(round.id(), &room, round.stage(), timeout);
                    }
                    round
                }
                None => {
                    let round = Round::new(room.clone(), Utc::now());
                    self.live.save_game(&round).await?;
                    log::info!("[room {}] opened fresh round {}", room, round.id());
                    self.sinks.game_created(&round);
                    round
                }
            };
            self.slots
                .write()
                .expect("slots poisoned")
                .insert(room, Arc::new(AsyncRwLock::new(round)));
        }
        Ok(())
    }
    /// Stop timers and close all live subscriptions.
    pub fn shutdown(&self) {
        self.timers.clear();
        self.hub.close_all();
        log::info!("[manager] shut down");
    }

    /// Snapshot copy of the current round, never a live reference.
    pub async fn current(&self, room: &RoomId) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let round = slot.read().await;
        Ok(round.clone())
    }
    /// Lucky roster as persisted at boot.
    pub async fn lucky_roster(&self) -> Result<LuckyRoster, GameError> {
        self.live
            .lucky_balls()
            .await
            .map_err(|e| GameError::SaveGameFailed(e.to_string()))?
            .ok_or(GameError::GameNotFound)
    }
    /// Attach a live subscriber. Runs under the room read lock so the
    /// snapshot notification cannot race a concurrent mutation.
    pub async fn subscribe(&self, room: &RoomId) -> Result<Arc<Subscription>, GameError> {
        let slot = self.slot(room)?;
        let round = slot.read().await;
        Ok(self.hub.subscribe(room, round.clone()))
    }
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Replace the slot with a fresh round. Only legal while the current
    /// round is still in `Preparation` or already over.
    pub async fn create(self: &Arc<Self>, room: &RoomId) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        if !matches!(round.stage(), Stage::Preparation | Stage::GameOver) {
            return Err(GameError::GameInProgress(round.stage()));
        }
        let fresh = Round::new(room.clone(), Utc::now());
        self.live
            .save_game(&fresh)
            .await
            .map_err(|e| GameError::SaveGameFailed(e.to_string()))?;
        self.timers.cancel(round.id());
        *round = fresh;
        self.sinks.game_created(&round);
        Ok(round.clone())
    }

    /// Advance the round along the catalogue graph.
    pub async fn advance(self: &Arc<Self>, room: &RoomId, force: bool) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        self.advance_locked(room, &mut round, force).await
    }
    /// Timer entry point. Re-validates round identity and armed stage
    /// under the room lock: a dealer command may have advanced or rotated
    /// the round between the timer firing and lock acquisition, and a
    /// stale timer must never advance a stage it was not armed for.
    async fn timed_advance(self: &Arc<Self>, room: &RoomId, round_id: ID<Round>, armed: Stage) {
        let Ok(slot) = self.slot(room) else { return };
        let mut round = slot.write().await;
        if round.id() != round_id || round.stage() != armed {
            log::debug!("[room {}] stale timer for {} ignored", room, armed);
            return;
        }
        if let Err(e) = self.advance_locked(room, &mut round, true).await {
            log::warn!("[room {}] timed advance failed: {}", room, e);
        }
    }
    async fn advance_locked(
        self: &Arc<Self>,
        room: &RoomId,
        round: &mut Round,
        force: bool,
    ) -> Result<Round, GameError> {
        let old = round.stage();
        if old.spec().requires_dealer_confirmation && !force {
            return Err(GameError::RequireDealerConfirmation(old));
        }
        let next = round.successor()?;
        self.timers.cancel(round.id());
        let now = Utc::now();
        round.enter(next, now);
        if next.is_terminal() {
            round.finish(now);
        }
        if let Err(e) = self.live.save_game(round).await {
            round.revert(old);
            return Err(GameError::SaveGameFailed(e.to_string()));
        }
        if let Some(timeout) = next.spec().timeout {
            self.install_timer(round.id(), room, next, timeout);
        }
        // successor-specific side effect, then the transition event
        if next == Stage::ExtraBallSideSelectBettingStart {
            let side = Side::random(&mut rand::rng());
            if round.select_side(side, now) {
                if let Err(e) = self.live.save_game(round).await {
                    log::error!("[room {}] side selection not persisted: {}", room, e);
                }
                self.sinks.side_selected(round, side);
            }
        }
        self.sinks.stage_changed(round, old, next);
        if next.is_terminal() {
            self.finalize(room, round).await;
        }
        Ok(round.clone())
    }

    /// Append a ball; a last ball schedules a forced advance once the
    /// room lock is released.
    pub async fn draw(
        self: &Arc<Self>,
        room: &RoomId,
        kind: BallKind,
        number: bgh_core::BallNumber,
        is_last: bool,
    ) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        let ball = round.draw(number, kind, is_last, Utc::now())?;
        if let Err(e) = self.live.save_game(&round).await {
            round.rollback_draw(kind);
            return Err(GameError::SaveGameFailed(e.to_string()));
        }
        self.sinks.ball_drawn(&round, &ball);
        let snapshot = round.clone();
        drop(round);
        if is_last {
            self.spawn_advance(room);
        }
        Ok(snapshot)
    }
    /// Toggle the jackpot arc. Idempotent: re-setting the same value
    /// changes nothing and emits nothing.
    pub async fn set_jackpot(
        self: &Arc<Self>,
        room: &RoomId,
        enabled: bool,
    ) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        if round.set_has_jackpot(enabled, Utc::now())? {
            if let Err(e) = self.live.save_game(&round).await {
                round
                    .set_has_jackpot(!enabled, Utc::now())
                    .expect("revert stays in a legal stage");
                return Err(GameError::SaveGameFailed(e.to_string()));
            }
        }
        Ok(round.clone())
    }
    /// Record the jackpot winner and schedule the advance out of the
    /// jackpot drawing stage.
    pub async fn notify_winner(
        self: &Arc<Self>,
        room: &RoomId,
        winner: &str,
    ) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        let backup = round.clone();
        round.set_jackpot_winner(winner, Utc::now())?;
        if let Err(e) = self.live.save_game(&round).await {
            *round = backup;
            return Err(GameError::SaveGameFailed(e.to_string()));
        }
        let snapshot = round.clone();
        drop(round);
        self.spawn_advance(room);
        Ok(snapshot)
    }
    /// Cancel the round: history write, `GameCancelled` fan-out, then a
    /// fresh `Preparation` round takes the slot.
    pub async fn cancel(self: &Arc<Self>, room: &RoomId, reason: &str) -> Result<Round, GameError> {
        let slot = self.slot(room)?;
        let mut round = slot.write().await;
        let backup = round.clone();
        let now = Utc::now();
        round.cancel(reason, now)?;
        if let Err(e) = self.history.save_game_history(&round).await {
            *round = backup;
            return Err(GameError::SaveGameFailed(e.to_string()));
        }
        self.timers.cancel(round.id());
        self.sinks.game_cancelled(&round, reason, now);
        let cancelled = round.clone();
        self.rotate(room, &mut round).await;
        Ok(cancelled)
    }

    /// Counts over the history store.
    pub async fn stats(&self) -> Result<(i64, i64), GameError> {
        let total = self
            .history
            .total_games_count()
            .await
            .map_err(|e| GameError::SaveGameFailed(e.to_string()))?;
        let cancelled = self
            .history
            .cancelled_games_count()
            .await
            .map_err(|e| GameError::SaveGameFailed(e.to_string()))?;
        Ok((total, cancelled))
    }

    /// Game-over tail: history write, `GameCompleted` fan-out, slot
    /// rotation. A failed history write leaves the slot unrotated and is
    /// logged; the dealer's next create overwrites it.
    async fn finalize(self: &Arc<Self>, room: &RoomId, round: &mut Round) {
        if let Err(e) = self.history.save_game_history(round).await {
            log::error!("[room {}] history write failed, slot not rotated: {}", room, e);
            return;
        }
        self.sinks.game_completed(round);
        self.rotate(room, round).await;
    }
    /// Replace the slot content with a fresh `Preparation` round.
    async fn rotate(self: &Arc<Self>, room: &RoomId, round: &mut Round) {
        if let Err(e) = self.live.delete_current_game(room).await {
            log::warn!("[room {}] stale slot not cleared: {}", room, e);
        }
        let fresh = Round::new(room.clone(), Utc::now());
        if let Err(e) = self.live.save_game(&fresh).await {
            log::error!("[room {}] fresh round not persisted: {}", room, e);
        }
        *round = fresh;
        self.sinks.game_created(round);
    }
    /// Forced advance as an independent task re-acquiring the room lock.
    fn spawn_advance(self: &Arc<Self>, room: &RoomId) {
        let manager = Arc::clone(self);
        let room = room.clone();
        tokio::spawn(async move {
            if let Err(e) = manager.advance(&room, true).await {
                log::warn!("[room {}] deferred advance failed: {}", room, e);
            }
        });
    }
    fn install_timer(
        self: &Arc<Self>,
        round: ID<Round>,
        room: &RoomId,
        armed: Stage,
        timeout: std::time::Duration,
    ) {
        let manager = Arc::clone(self);
        let room = room.clone();
        self.timers.schedule(round, timeout, move || async move {
            log::debug!("[room {}] stage timeout fired", room);
            manager.timed_advance(&room, round, armed).await;
        });
    }
}
