//! Message-bus producer.
//!
//! Downstream settlement and analytics consume three topics: final
//! results per round, stage/drawing status, and snapshot events. The
//! broker is optional infrastructure: when unconfigured the producer is
//! disabled and every publish is a logged no-op, and publish failures
//! never reach the mutating path.
use chrono::DateTime;
use chrono::Utc;
use rdkafka::ClientConfig;
use rdkafka::message::Header;
use rdkafka::message::OwnedHeaders;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use std::time::Duration;

/// One message per completed round, keyed by round id.
pub const RESULT_TOPIC: &str = "lottery-result-topic";
/// Phase transitions and drawing progress.
pub const STATUS_TOPIC: &str = "lottery-status-topic";
/// Round snapshot on every stage change.
pub const EVENTS_TOPIC: &str = "game_events";

/// Message tag carried as the `tag` header and `message_type` field.
pub const TAG_RESULT: &str = "lottery_result";
pub const TAG_STATUS: &str = "lottery_status";
pub const TAG_STAGE_CHANGE: &str = "stage_change";

/// JSON envelope shared by every topic.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Envelope {
    pub game_id: String,
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

impl Envelope {
    pub fn new(game_id: String, message_type: &str, payload: serde_json::Value) -> Self {
        Self {
            game_id,
            message_type: message_type.to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Kafka producer facade. `None` inside means configured-absent.
pub struct Broker {
    producer: Option<FutureProducer>,
    retries: u32,
}

impl Broker {
    /// Connects when a bootstrap list is configured, otherwise disabled.
    pub fn connect(brokers: Option<&str>) -> Self {
        let producer = match brokers {
            Some(list) if !list.is_empty() => {
                match ClientConfig::new()
                    .set("bootstrap.servers", list)
                    .set("message.timeout.ms", "5000")
                    .create::<FutureProducer>()
                {
                    Ok(producer) => {
                        log::info!("[broker] producing to {}", list);
                        Some(producer)
                    }
                    Err(e) => {
                        log::error!("[broker] producer init failed, running without: {}", e);
                        None
                    }
                }
            }
            _ => {
                log::warn!("[broker] no bootstrap servers configured, publishes are dropped");
                None
            }
        };
        Self {
            producer,
            retries: 0,
        }
    }
    pub fn disabled() -> Self {
        Self {
            producer: None,
            retries: 0,
        }
    }
    /// Policy knob: bounded re-sends after a failed publish. Default 0.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
    pub fn is_enabled(&self) -> bool {
        self.producer.is_some()
    }
    /// Fire-and-forget publish. Failures are logged and dropped; the
    /// durable live-store state stays authoritative.
    pub async fn publish(&self, topic: &str, envelope: &Envelope) {
        let Some(ref producer) = self.producer else {
            log::debug!("[broker] dropping {} for {}", envelope.message_type, envelope.game_id);
            return;
        };
        let payload = match serde_json::to_string(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("[broker] encode failed for {}: {}", envelope.game_id, e);
                return;
            }
        };
        for attempt in 0..=self.retries {
            let record = FutureRecord::to(topic)
                .key(&envelope.game_id)
                .payload(&payload)
                .headers(OwnedHeaders::new().insert(Header {
                    key: "tag",
                    value: Some(envelope.message_type.as_str()),
                }));
            match producer.send(record, Duration::from_secs(5)).await {
                Ok(_) => return,
                Err((e, _)) if attempt < self.retries => {
                    log::warn!(
                        "[broker] publish to {} failed (attempt {}): {}",
                        topic,
                        attempt + 1,
                        e
                    );
                }
                Err((e, _)) => {
                    log::error!("[broker] publish to {} dropped: {}", topic, e);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn envelope_flattens_payload_fields() {
        let envelope = Envelope::new(
            "round-1".to_string(),
            TAG_STAGE_CHANGE,
            serde_json::json!({ "stage": "GAME_STAGE_NEW_ROUND" }),
        );
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&envelope).unwrap()).unwrap();
        assert_eq!(json["game_id"], "round-1");
        assert_eq!(json["message_type"], "stage_change");
        assert_eq!(json["stage"], "GAME_STAGE_NEW_ROUND");
        assert!(json["timestamp"].is_string());
    }
    #[tokio::test]
    async fn disabled_broker_drops_silently() {
        let broker = Broker::disabled();
        assert!(!broker.is_enabled());
        let envelope = Envelope::new("round-1".to_string(), TAG_STATUS, serde_json::json!({}));
        broker.publish(STATUS_TOPIC, &envelope).await;
    }
}
