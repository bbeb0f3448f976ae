//! Protobuf contracts for the dealer API, plus domain-to-wire conversions.
//!
//! The semantic contract lives in `proto/dealer.proto`; this crate maps
//! domain types onto the generated messages. Enum mapping goes through
//! the shared wire names so the domain and the IDL cannot drift apart
//! silently.

/// Generated protobuf types.
pub mod pb {
    tonic::include_proto!("bingohall.v1");
}

use bgh_core::Unique;
use bgh_game::Ball;
use bgh_game::BallKind;
use bgh_game::Round;
use bgh_game::Side;
use bgh_game::Stage;
use chrono::DateTime;
use chrono::Utc;

fn time_string(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

fn optional_time_string(time: Option<DateTime<Utc>>) -> String {
    time.map(time_string).unwrap_or_default()
}

impl From<Stage> for pb::GameStage {
    fn from(stage: Stage) -> Self {
        pb::GameStage::from_str_name(stage.wire_name()).unwrap_or(pb::GameStage::Unspecified)
    }
}

impl From<BallKind> for pb::BallType {
    fn from(kind: BallKind) -> Self {
        pb::BallType::from_str_name(kind.wire_name()).unwrap_or(pb::BallType::Unspecified)
    }
}

impl From<Side> for pb::ExtraBallSide {
    fn from(side: Side) -> Self {
        pb::ExtraBallSide::from_str_name(side.wire_name())
            .unwrap_or(pb::ExtraBallSide::Unspecified)
    }
}

impl From<&Ball> for pb::Ball {
    fn from(ball: &Ball) -> Self {
        pb::Ball {
            number: ball.number as u32,
            r#type: pb::BallType::from(ball.kind) as i32,
            is_last: ball.is_last,
            drawn_at: time_string(ball.drawn_at),
        }
    }
}

impl From<&Round> for pb::GameSnapshot {
    fn from(round: &Round) -> Self {
        let balls = |kind| round.balls(kind).iter().map(pb::Ball::from).collect();
        pb::GameSnapshot {
            round_id: round.id().to_string(),
            room_id: round.room().clone(),
            stage: pb::GameStage::from(round.stage()) as i32,
            start_time: time_string(round.start_time()),
            last_update_time: time_string(round.last_update_time()),
            end_time: optional_time_string(round.end_time()),
            cancel_time: optional_time_string(round.cancel_time()),
            regular_balls: balls(BallKind::Regular),
            extra_balls: balls(BallKind::Extra),
            jackpot_balls: balls(BallKind::Jackpot),
            lucky_balls: balls(BallKind::Lucky),
            selected_side: pb::ExtraBallSide::from(round.selected_side()) as i32,
            has_jackpot: round.has_jackpot(),
            jackpot_winner: round.jackpot_winner().to_string(),
            is_cancelled: round.is_cancelled(),
            cancel_reason: round.cancel_reason().to_string(),
        }
    }
}

impl From<&Round> for pb::CommandReply {
    fn from(round: &Round) -> Self {
        pb::CommandReply {
            round_id: round.id().to_string(),
            stage: pb::GameStage::from(round.stage()) as i32,
        }
    }
}
