use super::*;
use bgh_core::BallNumber;
use bgh_core::ID;
use bgh_core::RoomId;
use bgh_core::Unique;
use chrono::DateTime;
use chrono::Utc;

/// Authoritative state of one round in one room.
///
/// All mutation goes through invariant-checking methods; the manager
/// sequences them under the per-room lock and persists after each commit.
/// Snapshots handed to callers are clones, never live references.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Round {
    id: ID<Round>,
    room: RoomId,
    stage: Stage,
    start_time: DateTime<Utc>,
    last_update_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    cancel_time: Option<DateTime<Utc>>,
    regular_balls: Vec<Ball>,
    extra_balls: Vec<Ball>,
    jackpot_balls: Vec<Ball>,
    lucky_balls: Vec<Ball>,
    selected_side: Side,
    has_jackpot: bool,
    jackpot_winner: String,
    is_cancelled: bool,
    cancel_reason: String,
}

impl Round {
    /// Fresh round in `Preparation`.
    pub fn new(room: RoomId, now: DateTime<Utc>) -> Self {
        Self {
            id: ID::default(),
            room,
            stage: Stage::Preparation,
            start_time: now,
            last_update_time: now,
            end_time: None,
            cancel_time: None,
            regular_balls: Vec::new(),
            extra_balls: Vec::new(),
            jackpot_balls: Vec::new(),
            lucky_balls: Vec::new(),
            selected_side: Side::Unspec,
            has_jackpot: false,
            jackpot_winner: String::new(),
            is_cancelled: false,
            cancel_reason: String::new(),
        }
    }
    pub fn room(&self) -> &RoomId {
        &self.room
    }
    pub fn stage(&self) -> Stage {
        self.stage
    }
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }
    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.last_update_time
    }
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
    pub fn cancel_time(&self) -> Option<DateTime<Utc>> {
        self.cancel_time
    }
    pub fn selected_side(&self) -> Side {
        self.selected_side
    }
    pub fn has_jackpot(&self) -> bool {
        self.has_jackpot
    }
    pub fn jackpot_winner(&self) -> &str {
        &self.jackpot_winner
    }
    pub fn is_cancelled(&self) -> bool {
        self.is_cancelled
    }
    pub fn cancel_reason(&self) -> &str {
        &self.cancel_reason
    }
    /// Draw-ordered sequence for one ball kind.
    pub fn balls(&self, kind: BallKind) -> &[Ball] {
        match kind {
            BallKind::Regular => &self.regular_balls,
            BallKind::Extra => &self.extra_balls,
            BallKind::Jackpot => &self.jackpot_balls,
            BallKind::Lucky => &self.lucky_balls,
        }
    }
    pub fn ball_count(&self) -> usize {
        self.regular_balls.len()
            + self.extra_balls.len()
            + self.jackpot_balls.len()
            + self.lucky_balls.len()
    }
    fn sequence_mut(&mut self, kind: BallKind) -> &mut Vec<Ball> {
        match kind {
            BallKind::Regular => &mut self.regular_balls,
            BallKind::Extra => &mut self.extra_balls,
            BallKind::Jackpot => &mut self.jackpot_balls,
            BallKind::Lucky => &mut self.lucky_balls,
        }
    }
}

impl Round {
    /// Catalogue successor of the current stage under the jackpot flag.
    pub fn successor(&self) -> Result<Stage, GameError> {
        self.stage
            .successor(self.has_jackpot)
            .ok_or(GameError::InvalidStageForAdvance(self.stage))
    }
    /// Swap the stage. The caller computes the successor and persists.
    pub fn enter(&mut self, next: Stage, now: DateTime<Utc>) {
        self.stage = next;
        self.last_update_time = now;
    }
    /// Roll the stage back after a failed persist.
    pub fn revert(&mut self, prev: Stage) {
        self.stage = prev;
    }
    /// Append a ball, validating stage match, jackpot gate, and uniqueness.
    pub fn draw(
        &mut self,
        number: BallNumber,
        kind: BallKind,
        is_last: bool,
        now: DateTime<Utc>,
    ) -> Result<Ball, GameError> {
        if self.stage != kind.drawing_stage() {
            return Err(GameError::InvalidStageForDraw(kind, self.stage));
        }
        if kind == BallKind::Jackpot && !self.has_jackpot {
            return Err(GameError::JackpotNotEnabled);
        }
        if self.balls(kind).iter().any(|b| b.number == number) {
            return Err(GameError::DuplicateBallNumber(number));
        }
        let ball = Ball::new(number, kind, is_last, now);
        self.sequence_mut(kind).push(ball);
        self.last_update_time = now;
        Ok(ball)
    }
    /// Drop the most recent ball of a kind after a failed persist.
    pub fn rollback_draw(&mut self, kind: BallKind) {
        self.sequence_mut(kind).pop();
    }
    /// Toggle the jackpot arc. Returns false when the flag already matched
    /// (no state change, no event).
    pub fn set_has_jackpot(&mut self, enabled: bool, now: DateTime<Utc>) -> Result<bool, GameError> {
        if !self.stage.allows_jackpot_setting() {
            return Err(GameError::InvalidStageForJpSetting(self.stage));
        }
        if self.has_jackpot == enabled {
            return Ok(false);
        }
        self.has_jackpot = enabled;
        self.last_update_time = now;
        Ok(true)
    }
    pub fn set_jackpot_winner(&mut self, winner: &str, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.stage != Stage::JackpotDrawingStart {
            return Err(GameError::InvalidStageForJpWinner(self.stage));
        }
        self.jackpot_winner = winner.to_string();
        self.last_update_time = now;
        Ok(())
    }
    /// Assign the extra-ball side. Happens exactly once, on the transition
    /// into side-select betting; later calls are ignored.
    pub fn select_side(&mut self, side: Side, now: DateTime<Utc>) -> bool {
        if self.selected_side.is_selected() {
            return false;
        }
        self.selected_side = side;
        self.last_update_time = now;
        true
    }
    pub fn cancel(&mut self, reason: &str, now: DateTime<Utc>) -> Result<(), GameError> {
        if self.is_cancelled {
            return Err(GameError::GameAlreadyCancelled);
        }
        if !self.stage.spec().allows_cancellation {
            return Err(GameError::CannotCancelAtStage(self.stage));
        }
        self.is_cancelled = true;
        self.cancel_reason = reason.to_string();
        self.cancel_time = Some(now);
        self.end_time = Some(now);
        self.last_update_time = now;
        Ok(())
    }
    /// Stamp the end time when the round reaches `GameOver`.
    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.last_update_time = now;
    }
}

impl Unique for Round {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
    fn round_at(stage: Stage) -> Round {
        let mut round = Round::new("SG01".to_string(), now());
        round.enter(stage, now());
        round
    }

    #[test]
    fn fresh_round_starts_in_preparation() {
        let round = Round::new("SG01".to_string(), now());
        assert_eq!(round.stage(), Stage::Preparation);
        assert_eq!(round.selected_side(), Side::Unspec);
        assert!(!round.has_jackpot());
        assert_eq!(round.ball_count(), 0);
    }
    #[test]
    fn draw_requires_matching_stage() {
        let mut round = round_at(Stage::CardPurchaseOpen);
        let err = round.draw(7, BallKind::Regular, false, now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STAGE_FOR_DRAW");
        let err = round.draw(7, BallKind::Lucky, false, now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STAGE_FOR_LUCKY_BALL");
    }
    #[test]
    fn duplicate_ball_is_rejected_and_state_unchanged() {
        let mut round = round_at(Stage::DrawingStart);
        round.draw(17, BallKind::Regular, false, now()).unwrap();
        let err = round.draw(17, BallKind::Regular, false, now()).unwrap_err();
        assert_eq!(err, GameError::DuplicateBallNumber(17));
        assert_eq!(round.balls(BallKind::Regular).len(), 1);
    }
    #[test]
    fn same_number_is_allowed_across_kinds() {
        let mut round = round_at(Stage::DrawingStart);
        round.draw(17, BallKind::Regular, false, now()).unwrap();
        round.enter(Stage::DrawingLuckyBallsStart, now());
        assert!(round.draw(17, BallKind::Lucky, false, now()).is_ok());
    }
    #[test]
    fn jackpot_ball_requires_enabled_flag() {
        let mut round = round_at(Stage::JackpotDrawingStart);
        let err = round.draw(42, BallKind::Jackpot, false, now()).unwrap_err();
        assert_eq!(err, GameError::JackpotNotEnabled);
    }
    #[test]
    fn jackpot_flag_only_toggles_in_early_stages() {
        let mut round = Round::new("SG01".to_string(), now());
        assert_eq!(round.set_has_jackpot(true, now()), Ok(true));
        // idempotent: same value changes nothing
        assert_eq!(round.set_has_jackpot(true, now()), Ok(false));
        round.enter(Stage::DrawingStart, now());
        let err = round.set_has_jackpot(false, now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STAGE_FOR_JP_SETTING");
        assert!(round.has_jackpot());
    }
    #[test]
    fn winner_only_in_jackpot_drawing() {
        let mut round = round_at(Stage::JackpotStart);
        let err = round.set_jackpot_winner("player123", now()).unwrap_err();
        assert_eq!(err.code(), "INVALID_STAGE_FOR_JP_WINNER");
        round.enter(Stage::JackpotDrawingStart, now());
        round.set_jackpot_winner("player123", now()).unwrap();
        assert_eq!(round.jackpot_winner(), "player123");
    }
    #[test]
    fn side_is_assigned_exactly_once() {
        let mut round = round_at(Stage::ExtraBallSideSelectBettingStart);
        assert!(round.select_side(Side::Left, now()));
        assert!(!round.select_side(Side::Right, now()));
        assert_eq!(round.selected_side(), Side::Left);
    }
    #[test]
    fn cancel_respects_the_catalogue() {
        let mut round = round_at(Stage::PayoutSettlement);
        let err = round.cancel("device failure", now()).unwrap_err();
        assert_eq!(err.code(), "CANNOT_CANCEL_AT_STAGE");
        let mut round = round_at(Stage::CardPurchaseOpen);
        round.cancel("device failure", now()).unwrap();
        assert!(round.is_cancelled());
        assert_eq!(round.cancel_reason(), "device failure");
        assert!(round.cancel_time().is_some());
        let err = round.cancel("again", now()).unwrap_err();
        assert_eq!(err, GameError::GameAlreadyCancelled);
    }
    #[test]
    fn rollback_draw_pops_the_rejected_ball() {
        let mut round = round_at(Stage::DrawingStart);
        round.draw(3, BallKind::Regular, false, now()).unwrap();
        round.draw(4, BallKind::Regular, false, now()).unwrap();
        round.rollback_draw(BallKind::Regular);
        let numbers: Vec<_> = round.balls(BallKind::Regular).iter().map(|b| b.number).collect();
        assert_eq!(numbers, vec![3]);
    }
    #[test]
    fn serde_mirror_round_trips() {
        let mut round = round_at(Stage::DrawingStart);
        round.draw(11, BallKind::Regular, false, now()).unwrap();
        round.draw(12, BallKind::Regular, true, now()).unwrap();
        let json = serde_json::to_string(&round).unwrap();
        let back: Round = serde_json::from_str(&json).unwrap();
        assert_eq!(back, round);
    }
}
