use std::time::Duration;

/// A node in the phase graph.
///
/// The declaration order documents the main line of play; the real order
/// is the successor edges in each [`StageSpec`]. The jackpot arc
/// (JackpotStart..JackpotSettlement) is skipped when the round has no
/// jackpot enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Preparation,
    NewRound,
    CardPurchaseOpen,
    CardPurchaseClose,
    DrawingStart,
    DrawingClose,
    ExtraBallPrepare,
    ExtraBallSideSelectBettingStart,
    ExtraBallSideSelectBettingClosed,
    ExtraBallWaitClaim,
    ExtraBallDrawingStart,
    ExtraBallDrawingClose,
    PayoutSettlement,
    JackpotStart,
    JackpotDrawingStart,
    JackpotDrawingClosed,
    JackpotSettlement,
    DrawingLuckyBallsStart,
    DrawingLuckyBallsClosed,
    GameOver,
}

/// Static catalogue entry for one stage.
///
/// `timeout: None` disables auto-advance. A stage whose entry requires
/// dealer confirmation can only be left with `force = true`.
#[derive(Clone, Copy, Debug)]
pub struct StageSpec {
    pub timeout: Option<Duration>,
    pub requires_dealer_confirmation: bool,
    pub allows_cancellation: bool,
    pub next_with_jackpot: Option<Stage>,
    pub next_without_jackpot: Option<Stage>,
}

const fn secs(s: u64) -> Option<Duration> {
    Some(Duration::from_secs(s))
}

const fn entry(
    timeout: Option<Duration>,
    confirm: bool,
    cancel: bool,
    next: Option<Stage>,
) -> StageSpec {
    StageSpec {
        timeout,
        requires_dealer_confirmation: confirm,
        allows_cancellation: cancel,
        next_with_jackpot: next,
        next_without_jackpot: next,
    }
}

impl Stage {
    /// Catalogue lookup. Exactly one catalogue shared across all rounds.
    pub const fn spec(self) -> StageSpec {
        use Stage::*;
        match self {
            Preparation => entry(None, false, false, Some(NewRound)),
            NewRound => entry(secs(5), false, true, Some(CardPurchaseOpen)),
            CardPurchaseOpen => entry(secs(90), false, true, Some(CardPurchaseClose)),
            CardPurchaseClose => entry(secs(5), false, true, Some(DrawingStart)),
            DrawingStart => entry(None, true, true, Some(DrawingClose)),
            DrawingClose => entry(secs(5), false, true, Some(ExtraBallPrepare)),
            ExtraBallPrepare => entry(secs(10), false, true, Some(ExtraBallSideSelectBettingStart)),
            ExtraBallSideSelectBettingStart => {
                entry(secs(30), false, true, Some(ExtraBallSideSelectBettingClosed))
            }
            ExtraBallSideSelectBettingClosed => entry(secs(5), false, true, Some(ExtraBallWaitClaim)),
            ExtraBallWaitClaim => entry(secs(30), false, true, Some(ExtraBallDrawingStart)),
            ExtraBallDrawingStart => entry(None, true, true, Some(ExtraBallDrawingClose)),
            ExtraBallDrawingClose => entry(secs(5), false, true, Some(PayoutSettlement)),
            // the only stage whose successor forks on the jackpot flag
            PayoutSettlement => StageSpec {
                timeout: secs(10),
                requires_dealer_confirmation: false,
                allows_cancellation: false,
                next_with_jackpot: Some(JackpotStart),
                next_without_jackpot: Some(DrawingLuckyBallsStart),
            },
            JackpotStart => entry(secs(10), false, false, Some(JackpotDrawingStart)),
            JackpotDrawingStart => entry(None, true, false, Some(JackpotDrawingClosed)),
            JackpotDrawingClosed => entry(secs(5), false, false, Some(JackpotSettlement)),
            JackpotSettlement => entry(secs(10), false, false, Some(DrawingLuckyBallsStart)),
            DrawingLuckyBallsStart => entry(None, true, false, Some(DrawingLuckyBallsClosed)),
            DrawingLuckyBallsClosed => entry(secs(5), false, false, Some(GameOver)),
            GameOver => entry(None, false, false, None),
        }
    }
    /// Successor under the given jackpot flag. None for terminal stages.
    pub fn successor(self, has_jackpot: bool) -> Option<Stage> {
        let spec = self.spec();
        if has_jackpot {
            spec.next_with_jackpot
        } else {
            spec.next_without_jackpot
        }
    }
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::GameOver)
    }
    /// Stages in which the jackpot flag may still be toggled.
    pub fn allows_jackpot_setting(self) -> bool {
        matches!(
            self,
            Stage::Preparation | Stage::NewRound | Stage::CardPurchaseOpen
        )
    }
    /// Wire-level enum name.
    pub fn wire_name(self) -> &'static str {
        match self {
            Stage::Preparation => "GAME_STAGE_PREPARATION",
            Stage::NewRound => "GAME_STAGE_NEW_ROUND",
            Stage::CardPurchaseOpen => "GAME_STAGE_CARD_PURCHASE_OPEN",
            Stage::CardPurchaseClose => "GAME_STAGE_CARD_PURCHASE_CLOSE",
            Stage::DrawingStart => "GAME_STAGE_DRAWING_START",
            Stage::DrawingClose => "GAME_STAGE_DRAWING_CLOSE",
            Stage::ExtraBallPrepare => "GAME_STAGE_EXTRA_BALL_PREPARE",
            Stage::ExtraBallSideSelectBettingStart => {
                "GAME_STAGE_EXTRA_BALL_SIDE_SELECT_BETTING_START"
            }
            Stage::ExtraBallSideSelectBettingClosed => {
                "GAME_STAGE_EXTRA_BALL_SIDE_SELECT_BETTING_CLOSED"
            }
            Stage::ExtraBallWaitClaim => "GAME_STAGE_EXTRA_BALL_WAIT_CLAIM",
            Stage::ExtraBallDrawingStart => "GAME_STAGE_EXTRA_BALL_DRAWING_START",
            Stage::ExtraBallDrawingClose => "GAME_STAGE_EXTRA_BALL_DRAWING_CLOSE",
            Stage::PayoutSettlement => "GAME_STAGE_PAYOUT_SETTLEMENT",
            Stage::JackpotStart => "GAME_STAGE_JACKPOT_START",
            Stage::JackpotDrawingStart => "GAME_STAGE_JACKPOT_DRAWING_START",
            Stage::JackpotDrawingClosed => "GAME_STAGE_JACKPOT_DRAWING_CLOSED",
            Stage::JackpotSettlement => "GAME_STAGE_JACKPOT_SETTLEMENT",
            Stage::DrawingLuckyBallsStart => "GAME_STAGE_DRAWING_LUCKY_BALLS_START",
            Stage::DrawingLuckyBallsClosed => "GAME_STAGE_DRAWING_LUCKY_BALLS_CLOSED",
            Stage::GameOver => "GAME_STAGE_GAME_OVER",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn main_line_reaches_game_over_without_jackpot() {
        let mut stage = Stage::Preparation;
        let mut hops = 0;
        while let Some(next) = stage.successor(false) {
            assert_ne!(next, stage);
            stage = next;
            hops += 1;
            assert!(hops < 32, "phase graph must terminate");
        }
        assert_eq!(stage, Stage::GameOver);
        // jackpot arc skipped entirely
        assert_eq!(hops, 15);
    }
    #[test]
    fn jackpot_arc_is_traversed_when_enabled() {
        let mut stage = Stage::Preparation;
        let mut visited = Vec::new();
        while let Some(next) = stage.successor(true) {
            visited.push(next);
            stage = next;
        }
        assert!(visited.contains(&Stage::JackpotStart));
        assert!(visited.contains(&Stage::JackpotSettlement));
        assert_eq!(stage, Stage::GameOver);
    }
    #[test]
    fn payout_settlement_forks_on_jackpot_flag() {
        assert_eq!(
            Stage::PayoutSettlement.successor(true),
            Some(Stage::JackpotStart)
        );
        assert_eq!(
            Stage::PayoutSettlement.successor(false),
            Some(Stage::DrawingLuckyBallsStart)
        );
    }
    #[test]
    fn dealer_drawing_stages_have_no_timeout() {
        for stage in [
            Stage::DrawingStart,
            Stage::ExtraBallDrawingStart,
            Stage::JackpotDrawingStart,
            Stage::DrawingLuckyBallsStart,
        ] {
            assert!(stage.spec().timeout.is_none());
            assert!(stage.spec().requires_dealer_confirmation);
        }
    }
    #[test]
    fn game_over_is_terminal() {
        assert!(Stage::GameOver.is_terminal());
        assert_eq!(Stage::GameOver.successor(true), None);
        assert_eq!(Stage::GameOver.successor(false), None);
    }
}
