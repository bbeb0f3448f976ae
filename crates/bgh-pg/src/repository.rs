use super::*;
use async_trait::async_trait;
use bgh_core::Unique;
use bgh_game::BallKind;
use bgh_game::Round;
use std::sync::Arc;
use tokio_postgres::Client;

/// Errors from the history store.
#[derive(Debug, Clone)]
pub struct HistoryError(pub String);

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "history store: {}", self.0)
    }
}

impl std::error::Error for HistoryError {}

impl From<PgErr> for HistoryError {
    fn from(e: PgErr) -> Self {
        Self(e.to_string())
    }
}

/// Append-only store for terminated rounds.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn save_game_history(&self, round: &Round) -> Result<(), HistoryError>;
    async fn total_games_count(&self) -> Result<i64, HistoryError>;
    async fn cancelled_games_count(&self) -> Result<i64, HistoryError>;
}

/// Run all DDL. Idempotent; invoked once at boot.
pub async fn migrate(client: &Client) -> Result<(), PgErr> {
    for ddl in [
        GameRow::creates(),
        DrawnBallRow::creates(),
        ExtraBallRow::creates(),
        LuckyNumberRow::creates(),
        JpGameRow::creates(),
        JpBallRow::creates(),
        JpWinnerRow::creates(),
        JpParticipationRow::creates(),
        GameRow::indices(),
    ] {
        if !ddl.is_empty() {
            client.batch_execute(ddl).await?;
        }
    }
    Ok(())
}

fn json_of(round: &Round, kind: BallKind) -> serde_json::Value {
    serde_json::to_value(round.balls(kind)).unwrap_or(serde_json::Value::Null)
}

#[async_trait]
impl HistoryStore for Arc<Client> {
    async fn save_game_history(&self, round: &Round) -> Result<(), HistoryError> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                GAMES,
                " (id, room, stage, start_time, last_update_time, end_time, cancel_time,
                   regular_balls, extra_balls, jackpot_balls, lucky_balls,
                   selected_side, has_jackpot, jackpot_winner, is_cancelled, cancel_reason)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
            ),
            &[
                &round.id().inner(),
                &round.room(),
                &round.stage().wire_name(),
                &round.start_time(),
                &round.last_update_time(),
                &round.end_time(),
                &round.cancel_time(),
                &json_of(round, BallKind::Regular),
                &json_of(round, BallKind::Extra),
                &json_of(round, BallKind::Jackpot),
                &json_of(round, BallKind::Lucky),
                &round.selected_side().wire_name(),
                &round.has_jackpot(),
                &round.jackpot_winner(),
                &round.is_cancelled(),
                &round.cancel_reason(),
            ],
        )
        .await
        .map_err(HistoryError::from)?;
        for (seq, ball) in round.balls(BallKind::Regular).iter().enumerate() {
            self.execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    DRAWN_BALLS,
                    " (game_id, seq, number, is_last, drawn_at) VALUES ($1, $2, $3, $4, $5)"
                ),
                &[
                    &round.id().inner(),
                    &(seq as i32),
                    &(ball.number as i16),
                    &ball.is_last,
                    &ball.drawn_at,
                ],
            )
            .await
            .map_err(HistoryError::from)?;
        }
        for (seq, ball) in round.balls(BallKind::Extra).iter().enumerate() {
            self.execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    EXTRA_BALLS,
                    " (game_id, seq, number, is_last, drawn_at) VALUES ($1, $2, $3, $4, $5)"
                ),
                &[
                    &round.id().inner(),
                    &(seq as i32),
                    &(ball.number as i16),
                    &ball.is_last,
                    &ball.drawn_at,
                ],
            )
            .await
            .map_err(HistoryError::from)?;
        }
        for (seq, ball) in round.balls(BallKind::Lucky).iter().enumerate() {
            self.execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    LUCKY_NUMBERS,
                    " (game_id, seq, number, drawn_at) VALUES ($1, $2, $3, $4)"
                ),
                &[
                    &round.id().inner(),
                    &(seq as i32),
                    &(ball.number as i16),
                    &ball.drawn_at,
                ],
            )
            .await
            .map_err(HistoryError::from)?;
        }
        if round.has_jackpot() {
            self.execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    JP_GAMES,
                    " (game_id, has_winner) VALUES ($1, $2)"
                ),
                &[&round.id().inner(), &!round.jackpot_winner().is_empty()],
            )
            .await
            .map_err(HistoryError::from)?;
            for (seq, ball) in round.balls(BallKind::Jackpot).iter().enumerate() {
                self.execute(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        JP_BALLS,
                        " (game_id, seq, number, is_last, drawn_at) VALUES ($1, $2, $3, $4, $5)"
                    ),
                    &[
                        &round.id().inner(),
                        &(seq as i32),
                        &(ball.number as i16),
                        &ball.is_last,
                        &ball.drawn_at,
                    ],
                )
                .await
                .map_err(HistoryError::from)?;
            }
            if !round.jackpot_winner().is_empty() {
                self.execute(
                    const_format::concatcp!(
                        "INSERT INTO ",
                        JP_WINNERS,
                        " (game_id, winner_id) VALUES ($1, $2)"
                    ),
                    &[&round.id().inner(), &round.jackpot_winner()],
                )
                .await
                .map_err(HistoryError::from)?;
            }
        }
        log::info!("[history] recorded round {}", round.id());
        Ok(())
    }
    async fn total_games_count(&self) -> Result<i64, HistoryError> {
        self.query_one(const_format::concatcp!("SELECT COUNT(*) FROM ", GAMES), &[])
            .await
            .map(|row| row.get::<_, i64>(0))
            .map_err(HistoryError::from)
    }
    async fn cancelled_games_count(&self) -> Result<i64, HistoryError> {
        self.query_one(
            const_format::concatcp!(
                "SELECT COUNT(*) FROM ",
                GAMES,
                " WHERE is_cancelled = TRUE"
            ),
            &[],
        )
        .await
        .map(|row| row.get::<_, i64>(0))
        .map_err(HistoryError::from)
    }
}
