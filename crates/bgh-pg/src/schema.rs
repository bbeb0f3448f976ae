/// Table names, shared so SQL can be assembled at compile time.
pub const GAMES: &str = "games";
pub const DRAWN_BALLS: &str = "drawn_balls";
pub const EXTRA_BALLS: &str = "extra_balls";
pub const LUCKY_NUMBERS: &str = "lucky_numbers";
pub const JP_GAMES: &str = "jp_games";
pub const JP_BALLS: &str = "jp_balls";
pub const JP_WINNERS: &str = "jp_winners";
pub const JP_PARTICIPATIONS: &str = "jp_participations";

/// Schema metadata for history tables.
///
/// All methods return `&'static str` so DDL is assembled at compile time
/// via [`const_format::concatcp!`]. The trait contains no I/O; execution
/// happens in [`super::migrate`].
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
}

/// One row per terminated round.
pub struct GameRow;
/// Regular balls, one row per draw, in insertion order.
pub struct DrawnBallRow;
/// Extra balls, one row per draw.
pub struct ExtraBallRow;
/// Lucky balls, one row per draw.
pub struct LuckyNumberRow;
/// Jackpot arc metadata for rounds that ran it.
pub struct JpGameRow;
/// Jackpot balls, one row per draw.
pub struct JpBallRow;
/// Jackpot winner notifications.
pub struct JpWinnerRow;
/// Jackpot participations, filled by the settlement service.
pub struct JpParticipationRow;

impl Schema for GameRow {
    fn name() -> &'static str {
        GAMES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            GAMES,
            " (
                id               UUID PRIMARY KEY,
                room             TEXT NOT NULL,
                stage            TEXT NOT NULL,
                start_time       TIMESTAMPTZ NOT NULL,
                last_update_time TIMESTAMPTZ NOT NULL,
                end_time         TIMESTAMPTZ,
                cancel_time      TIMESTAMPTZ,
                regular_balls    JSONB NOT NULL,
                extra_balls      JSONB NOT NULL,
                jackpot_balls    JSONB NOT NULL,
                lucky_balls      JSONB NOT NULL,
                selected_side    TEXT NOT NULL,
                has_jackpot      BOOLEAN NOT NULL,
                jackpot_winner   TEXT NOT NULL,
                is_cancelled     BOOLEAN NOT NULL,
                cancel_reason    TEXT NOT NULL
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_games_room ON ",
            GAMES,
            " (room, start_time);"
        )
    }
}

impl Schema for DrawnBallRow {
    fn name() -> &'static str {
        DRAWN_BALLS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            DRAWN_BALLS,
            " (
                game_id  UUID NOT NULL,
                seq      INTEGER NOT NULL,
                number   SMALLINT NOT NULL,
                is_last  BOOLEAN NOT NULL,
                drawn_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (game_id, seq)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for ExtraBallRow {
    fn name() -> &'static str {
        EXTRA_BALLS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            EXTRA_BALLS,
            " (
                game_id  UUID NOT NULL,
                seq      INTEGER NOT NULL,
                number   SMALLINT NOT NULL,
                is_last  BOOLEAN NOT NULL,
                drawn_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (game_id, seq)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for LuckyNumberRow {
    fn name() -> &'static str {
        LUCKY_NUMBERS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            LUCKY_NUMBERS,
            " (
                game_id  UUID NOT NULL,
                seq      INTEGER NOT NULL,
                number   SMALLINT NOT NULL,
                drawn_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (game_id, seq)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for JpGameRow {
    fn name() -> &'static str {
        JP_GAMES
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            JP_GAMES,
            " (
                game_id    UUID PRIMARY KEY,
                has_winner BOOLEAN NOT NULL
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for JpBallRow {
    fn name() -> &'static str {
        JP_BALLS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            JP_BALLS,
            " (
                game_id  UUID NOT NULL,
                seq      INTEGER NOT NULL,
                number   SMALLINT NOT NULL,
                is_last  BOOLEAN NOT NULL,
                drawn_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (game_id, seq)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for JpWinnerRow {
    fn name() -> &'static str {
        JP_WINNERS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            JP_WINNERS,
            " (
                game_id   UUID NOT NULL,
                winner_id TEXT NOT NULL,
                PRIMARY KEY (game_id, winner_id)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}

impl Schema for JpParticipationRow {
    fn name() -> &'static str {
        JP_PARTICIPATIONS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            JP_PARTICIPATIONS,
            " (
                game_id   UUID NOT NULL,
                player_id TEXT NOT NULL,
                joined_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (game_id, player_id)
            );"
        )
    }
    fn indices() -> &'static str {
        ""
    }
}
