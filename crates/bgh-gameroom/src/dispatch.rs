use super::Event;
use super::Hub;
use bgh_broker::*;
use bgh_core::Unique;
use bgh_game::*;
use chrono::DateTime;
use chrono::Utc;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;

/// Observer of committed state changes, one method per event kind.
///
/// All methods default to no-ops so a sink implements only what it
/// consumes. Handlers run synchronously on the mutating path after the
/// change persisted; they must not block.
pub trait EventSink: Send + Sync {
    fn stage_changed(&self, _game: &Round, _old: Stage, _new: Stage) {}
    fn ball_drawn(&self, _game: &Round, _ball: &Ball) {}
    fn game_created(&self, _game: &Round) {}
    fn game_cancelled(&self, _game: &Round, _reason: &str, _at: DateTime<Utc>) {}
    fn game_completed(&self, _game: &Round) {}
    fn side_selected(&self, _game: &Round, _side: Side) {}
}

/// Composite sink: delivers to every registered sink, isolating panics
/// so one failing consumer never reaches the manager or its peers.
#[derive(Default)]
pub struct Fanout {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn register(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
    fn each(&self, what: &str, call: impl Fn(&dyn EventSink)) {
        for sink in &self.sinks {
            if catch_unwind(AssertUnwindSafe(|| call(sink.as_ref()))).is_err() {
                log::error!("[fanout] sink panicked delivering {}", what);
            }
        }
    }
}

impl EventSink for Fanout {
    fn stage_changed(&self, game: &Round, old: Stage, new: Stage) {
        self.each("stage_changed", |s| s.stage_changed(game, old, new));
    }
    fn ball_drawn(&self, game: &Round, ball: &Ball) {
        self.each("ball_drawn", |s| s.ball_drawn(game, ball));
    }
    fn game_created(&self, game: &Round) {
        self.each("game_created", |s| s.game_created(game));
    }
    fn game_cancelled(&self, game: &Round, reason: &str, at: DateTime<Utc>) {
        self.each("game_cancelled", |s| s.game_cancelled(game, reason, at));
    }
    fn game_completed(&self, game: &Round) {
        self.each("game_completed", |s| s.game_completed(game));
    }
    fn side_selected(&self, game: &Round, side: Side) {
        self.each("side_selected", |s| s.side_selected(game, side));
    }
}

/// In-process event log.
pub struct LogSink;

impl EventSink for LogSink {
    fn stage_changed(&self, game: &Round, old: Stage, new: Stage) {
        log::info!("[room {}] stage {} -> {}", game.room(), old, new);
    }
    fn ball_drawn(&self, game: &Round, ball: &Ball) {
        log::info!("[room {}] drawn {}", game.room(), ball);
    }
    fn game_created(&self, game: &Round) {
        log::info!("[room {}] created round {}", game.room(), game.id());
    }
    fn game_cancelled(&self, game: &Round, reason: &str, _at: DateTime<Utc>) {
        log::warn!("[room {}] round {} cancelled: {}", game.room(), game.id(), reason);
    }
    fn game_completed(&self, game: &Round) {
        log::info!("[room {}] round {} complete", game.room(), game.id());
    }
    fn side_selected(&self, game: &Round, side: Side) {
        log::info!("[room {}] side selected {}", game.room(), side);
    }
}

/// Bridges committed changes into per-room subscriber queues.
pub struct HubSink {
    hub: Arc<Hub>,
}

impl HubSink {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}

impl EventSink for HubSink {
    fn stage_changed(&self, game: &Round, old: Stage, new: Stage) {
        self.hub.publish(
            game.room(),
            Event::StageChanged {
                round: game.id(),
                old,
                new,
            },
        );
    }
    fn ball_drawn(&self, game: &Round, ball: &Ball) {
        self.hub.publish(
            game.room(),
            Event::BallDrawn {
                round: game.id(),
                ball: *ball,
            },
        );
    }
    fn game_created(&self, game: &Round) {
        self.hub
            .publish(game.room(), Event::GameCreated { game: game.clone() });
    }
    fn game_cancelled(&self, game: &Round, reason: &str, at: DateTime<Utc>) {
        self.hub.publish(
            game.room(),
            Event::GameCancelled {
                round: game.id(),
                reason: reason.to_string(),
                at,
            },
        );
    }
    fn game_completed(&self, game: &Round) {
        self.hub
            .publish(game.room(), Event::GameCompleted { game: game.clone() });
    }
    fn side_selected(&self, game: &Round, side: Side) {
        self.hub.publish(
            game.room(),
            Event::SideSelected {
                round: game.id(),
                side,
            },
        );
    }
}

/// Bridges committed changes onto the message bus.
///
/// Publishes are spawned fire-and-forget so broker latency never holds
/// the room lock; the broker itself logs and drops failures.
pub struct BrokerSink {
    broker: Arc<Broker>,
}

impl BrokerSink {
    pub fn new(broker: Arc<Broker>) -> Self {
        Self { broker }
    }
    fn send(&self, topic: &'static str, envelope: Envelope) {
        let broker = Arc::clone(&self.broker);
        tokio::spawn(async move { broker.publish(topic, &envelope).await });
    }
}

impl EventSink for BrokerSink {
    fn stage_changed(&self, game: &Round, old: Stage, new: Stage) {
        self.send(
            STATUS_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_STATUS,
                serde_json::json!({
                    "room": game.room(),
                    "old_stage": old.wire_name(),
                    "new_stage": new.wire_name(),
                }),
            ),
        );
        self.send(
            EVENTS_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_STAGE_CHANGE,
                serde_json::json!({ "game": game }),
            ),
        );
    }
    fn ball_drawn(&self, game: &Round, ball: &Ball) {
        self.send(
            STATUS_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_STATUS,
                serde_json::json!({
                    "room": game.room(),
                    "ball": ball,
                    "drawn": game.ball_count(),
                }),
            ),
        );
    }
    fn game_cancelled(&self, game: &Round, reason: &str, _at: DateTime<Utc>) {
        self.send(
            STATUS_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_STATUS,
                serde_json::json!({ "room": game.room(), "cancelled": true, "reason": reason }),
            ),
        );
    }
    fn game_completed(&self, game: &Round) {
        self.send(
            RESULT_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_RESULT,
                serde_json::json!({
                    "room": game.room(),
                    "regular_balls": game.balls(BallKind::Regular),
                    "extra_balls": game.balls(BallKind::Extra),
                    "jackpot_balls": game.balls(BallKind::Jackpot),
                    "lucky_balls": game.balls(BallKind::Lucky),
                    "selected_side": game.selected_side().wire_name(),
                    "jackpot_winner": game.jackpot_winner(),
                }),
            ),
        );
    }
    fn side_selected(&self, game: &Round, side: Side) {
        self.send(
            STATUS_TOPIC,
            Envelope::new(
                game.id().to_string(),
                TAG_STATUS,
                serde_json::json!({ "room": game.room(), "selected_side": side.wire_name() }),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct Panicking;
    impl EventSink for Panicking {
        fn game_created(&self, _game: &Round) {
            panic!("consumer bug");
        }
    }
    #[derive(Default)]
    struct Counting(AtomicUsize);
    impl EventSink for Counting {
        fn game_created(&self, _game: &Round) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn panicking_sink_does_not_starve_the_rest() {
        let counting = Arc::new(Counting::default());
        let fanout = Fanout::new()
            .register(Arc::new(Panicking))
            .register(counting.clone());
        let game = Round::new("SG01".to_string(), Utc::now());
        fanout.game_created(&game);
        fanout.game_created(&game);
        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
    }
}
