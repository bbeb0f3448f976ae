use super::StoreError;
use async_trait::async_trait;
use bgh_core::RoomId;
use bgh_game::LuckyRoster;
use bgh_game::Round;
use redis::AsyncCommands;

/// Global slot for the lucky-number roster.
pub const LUCKY_KEY: &str = "lucky_balls";

/// Per-room slot for the current round.
pub fn game_key(room: &RoomId) -> String {
    format!("current_game:{}", room)
}

/// Low-latency key-value store holding the current round per room.
#[async_trait]
pub trait LiveStore: Send + Sync {
    async fn save_game(&self, round: &Round) -> Result<(), StoreError>;
    async fn current_game(&self, room: &RoomId) -> Result<Option<Round>, StoreError>;
    async fn delete_current_game(&self, room: &RoomId) -> Result<(), StoreError>;
    async fn lucky_balls(&self) -> Result<Option<LuckyRoster>, StoreError>;
    async fn save_lucky_balls(&self, roster: &LuckyRoster) -> Result<(), StoreError>;
}

/// Redis-backed live store. Rounds are mirrored as JSON.
pub struct RedisStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connects and returns a store with automatic reconnection.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(StoreError::from)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(StoreError::from)?;
        log::info!("[cache] connected to {}", url);
        Ok(Self { conn })
    }
}

#[async_trait]
impl LiveStore for RedisStore {
    async fn save_game(&self, round: &Round) -> Result<(), StoreError> {
        let json = serde_json::to_string(round)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(game_key(round.room()), json).await?;
        Ok(())
    }
    async fn current_game(&self, room: &RoomId) -> Result<Option<Round>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(game_key(room)).await?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
    async fn delete_current_game(&self, room: &RoomId) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(game_key(room)).await?;
        Ok(())
    }
    async fn lucky_balls(&self) -> Result<Option<LuckyRoster>, StoreError> {
        let mut conn = self.conn.clone();
        let json: Option<String> = conn.get(LUCKY_KEY).await?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
    async fn save_lucky_balls(&self, roster: &LuckyRoster) -> Result<(), StoreError> {
        let json = serde_json::to_string(roster)?;
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(LUCKY_KEY, json).await?;
        Ok(())
    }
}
