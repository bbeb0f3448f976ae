use super::Stage;
use bgh_core::BALL_MAX;
use bgh_core::BallNumber;
use chrono::DateTime;
use chrono::Utc;

/// Which sequence of a round a ball belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BallKind {
    Regular,
    Extra,
    Jackpot,
    Lucky,
}

impl BallKind {
    /// The only stage in which a ball of this kind may be drawn.
    pub fn drawing_stage(self) -> Stage {
        match self {
            BallKind::Regular => Stage::DrawingStart,
            BallKind::Extra => Stage::ExtraBallDrawingStart,
            BallKind::Jackpot => Stage::JackpotDrawingStart,
            BallKind::Lucky => Stage::DrawingLuckyBallsStart,
        }
    }
    /// Inclusive upper bound on the printed number for this kind.
    pub fn limit(self) -> BallNumber {
        BALL_MAX
    }
    /// Wire-level enum name.
    pub fn wire_name(self) -> &'static str {
        match self {
            BallKind::Regular => "BALL_TYPE_REGULAR",
            BallKind::Extra => "BALL_TYPE_EXTRA",
            BallKind::Jackpot => "BALL_TYPE_JACKPOT",
            BallKind::Lucky => "BALL_TYPE_LUCKY",
        }
    }
}

impl std::fmt::Display for BallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One drawn ball. Sequence position = draw order within its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ball {
    pub number: BallNumber,
    pub kind: BallKind,
    pub is_last: bool,
    pub drawn_at: DateTime<Utc>,
}

impl Ball {
    pub fn new(number: BallNumber, kind: BallKind, is_last: bool, drawn_at: DateTime<Utc>) -> Self {
        Self {
            number,
            kind,
            is_last,
            drawn_at,
        }
    }
}

impl std::fmt::Display for Ball {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.kind, self.number)?;
        if self.is_last {
            write!(f, " (last)")?;
        }
        Ok(())
    }
}
