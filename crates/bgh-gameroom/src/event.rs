use bgh_core::ID;
use bgh_game::*;
use chrono::DateTime;
use chrono::Utc;

/// Events delivered to live subscribers, in commit order per room.
///
/// `Notification` is synthetic: it opens every subscription with the
/// current round snapshot before the live tail attaches. `Heartbeat`
/// keeps long-lived streams alive while a room is idle.
#[derive(Clone, Debug)]
pub enum Event {
    StageChanged {
        round: ID<Round>,
        old: Stage,
        new: Stage,
    },
    BallDrawn {
        round: ID<Round>,
        ball: Ball,
    },
    GameCreated {
        game: Round,
    },
    GameCancelled {
        round: ID<Round>,
        reason: String,
        at: DateTime<Utc>,
    },
    GameCompleted {
        game: Round,
    },
    SideSelected {
        round: ID<Round>,
        side: Side,
    },
    Notification {
        game: Round,
    },
    Heartbeat,
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::StageChanged { old, new, .. } => write!(f, "stage {} -> {}", old, new),
            Event::BallDrawn { ball, .. } => write!(f, "drawn {}", ball),
            Event::GameCreated { game } => write!(f, "created round {}", bgh_core::Unique::id(game)),
            Event::GameCancelled { reason, .. } => write!(f, "cancelled: {}", reason),
            Event::GameCompleted { game } => {
                write!(f, "completed round {}", bgh_core::Unique::id(game))
            }
            Event::SideSelected { side, .. } => write!(f, "side {}", side),
            Event::Notification { .. } => write!(f, "snapshot"),
            Event::Heartbeat => write!(f, "heartbeat"),
        }
    }
}
