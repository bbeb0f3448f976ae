use super::BallKind;
use super::Stage;
use bgh_core::BallNumber;

/// Domain errors surfaced by the round manager.
///
/// Every variant carries a stable string code that ingress maps 1-to-1
/// onto the wire status; the code never changes even if the message does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    GameNotFound,
    GameInProgress(Stage),
    GameAlreadyCancelled,
    CannotCancelAtStage(Stage),
    RequireDealerConfirmation(Stage),
    InvalidStageForAdvance(Stage),
    InvalidStageForDraw(BallKind, Stage),
    InvalidStageForJpWinner(Stage),
    InvalidStageForJpSetting(Stage),
    DuplicateBallNumber(BallNumber),
    JackpotNotEnabled,
    SaveGameFailed(String),
}

impl GameError {
    /// Stable error code carried to the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GameNotFound => "GAME_NOT_FOUND",
            Self::GameInProgress(_) => "GAME_IN_PROGRESS",
            Self::GameAlreadyCancelled => "GAME_ALREADY_CANCELLED",
            Self::CannotCancelAtStage(_) => "CANNOT_CANCEL_AT_STAGE",
            Self::RequireDealerConfirmation(_) => "REQUIRE_DEALER_CONFIRMATION",
            Self::InvalidStageForAdvance(_) => "INVALID_STAGE_FOR_ADVANCE",
            Self::InvalidStageForDraw(BallKind::Regular, _) => "INVALID_STAGE_FOR_DRAW",
            Self::InvalidStageForDraw(BallKind::Extra, _) => "INVALID_STAGE_FOR_EXTRA_BALL",
            Self::InvalidStageForDraw(BallKind::Jackpot, _) => "INVALID_STAGE_FOR_JP_BALL",
            Self::InvalidStageForDraw(BallKind::Lucky, _) => "INVALID_STAGE_FOR_LUCKY_BALL",
            Self::InvalidStageForJpWinner(_) => "INVALID_STAGE_FOR_JP_WINNER",
            Self::InvalidStageForJpSetting(_) => "INVALID_STAGE_FOR_JP_SETTING",
            Self::DuplicateBallNumber(_) => "DUPLICATE_BALL_NUMBER",
            Self::JackpotNotEnabled => "JACKPOT_NOT_ENABLED",
            Self::SaveGameFailed(_) => "SAVE_GAME_FAILED",
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GameNotFound => write!(f, "{}: no current round in slot", self.code()),
            Self::GameInProgress(stage) => {
                write!(f, "{}: active round in stage {}", self.code(), stage)
            }
            Self::GameAlreadyCancelled => write!(f, "{}: round already cancelled", self.code()),
            Self::CannotCancelAtStage(stage) => {
                write!(f, "{}: catalogue forbids cancel in {}", self.code(), stage)
            }
            Self::RequireDealerConfirmation(stage) => {
                write!(f, "{}: leaving {} requires force", self.code(), stage)
            }
            Self::InvalidStageForAdvance(stage) => {
                write!(f, "{}: no successor from {}", self.code(), stage)
            }
            Self::InvalidStageForDraw(kind, stage) => {
                write!(f, "{}: cannot draw {} in {}", self.code(), kind, stage)
            }
            Self::InvalidStageForJpWinner(stage) => {
                write!(f, "{}: cannot set winner in {}", self.code(), stage)
            }
            Self::InvalidStageForJpSetting(stage) => {
                write!(f, "{}: cannot toggle jackpot in {}", self.code(), stage)
            }
            Self::DuplicateBallNumber(number) => {
                write!(f, "{}: ball #{} already drawn", self.code(), number)
            }
            Self::JackpotNotEnabled => write!(f, "{}: round has no jackpot", self.code()),
            Self::SaveGameFailed(detail) => write!(f, "{}: {}", self.code(), detail),
        }
    }
}

impl std::error::Error for GameError {}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn draw_codes_distinguish_ball_kinds() {
        let stage = Stage::Preparation;
        assert_eq!(
            GameError::InvalidStageForDraw(BallKind::Regular, stage).code(),
            "INVALID_STAGE_FOR_DRAW"
        );
        assert_eq!(
            GameError::InvalidStageForDraw(BallKind::Extra, stage).code(),
            "INVALID_STAGE_FOR_EXTRA_BALL"
        );
        assert_eq!(
            GameError::InvalidStageForDraw(BallKind::Jackpot, stage).code(),
            "INVALID_STAGE_FOR_JP_BALL"
        );
        assert_eq!(
            GameError::InvalidStageForDraw(BallKind::Lucky, stage).code(),
            "INVALID_STAGE_FOR_LUCKY_BALL"
        );
    }
    #[test]
    fn display_leads_with_the_code() {
        let err = GameError::DuplicateBallNumber(17);
        assert!(err.to_string().starts_with("DUPLICATE_BALL_NUMBER"));
    }
}
