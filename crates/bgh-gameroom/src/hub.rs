use super::Event;
use bgh_core::HEARTBEAT_INTERVAL;
use bgh_core::ID;
use bgh_core::RoomId;
use bgh_core::SLOW_CONSUMER_STRIKES;
use bgh_core::SUBSCRIPTION_QUEUE_CAPACITY;
use bgh_game::Round;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;
use tokio::sync::Notify;

/// One live subscriber's bounded event queue.
///
/// Enqueue never blocks: a full queue drops its oldest event and records
/// a strike, and three strikes close the subscription so one stalled
/// client cannot hold room delivery hostage.
pub struct Subscription {
    id: ID<Subscription>,
    room: RoomId,
    queue: Mutex<VecDeque<Event>>,
    notify: Notify,
    strikes: AtomicU8,
    closed: AtomicBool,
}

impl Subscription {
    fn new(room: RoomId) -> Self {
        Self {
            id: ID::default(),
            room,
            queue: Mutex::new(VecDeque::with_capacity(SUBSCRIPTION_QUEUE_CAPACITY)),
            notify: Notify::new(),
            strikes: AtomicU8::new(0),
            closed: AtomicBool::new(false),
        }
    }
    pub fn room(&self) -> &RoomId {
        &self.room
    }
    pub fn strikes(&self) -> u8 {
        self.strikes.load(Ordering::SeqCst)
    }
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
    /// Queued but not yet consumed events.
    pub fn depth(&self) -> usize {
        self.queue.lock().expect("queue poisoned").len()
    }
    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        self.notify.notify_one();
    }
    fn push(&self, event: Event) {
        if self.is_closed() {
            return;
        }
        {
            let mut queue = self.queue.lock().expect("queue poisoned");
            if queue.len() >= SUBSCRIPTION_QUEUE_CAPACITY {
                if self.strikes.load(Ordering::SeqCst) >= SLOW_CONSUMER_STRIKES {
                    drop(queue);
                    log::warn!("[hub {}] closing slow consumer", self.id);
                    self.close();
                    return;
                }
                queue.pop_front();
                let strikes = self.strikes.fetch_add(1, Ordering::SeqCst) + 1;
                log::warn!("[hub {}] slow consumer strike {}", self.id, strikes);
            }
            queue.push_back(event);
        }
        self.notify.notify_one();
    }
    /// Next event, or a heartbeat after 15 idle seconds. `None` once the
    /// subscription is closed and drained.
    pub async fn next(&self) -> Option<Event> {
        loop {
            if let Some(event) = self.queue.lock().expect("queue poisoned").pop_front() {
                return Some(event);
            }
            if self.is_closed() {
                return None;
            }
            match tokio::time::timeout(HEARTBEAT_INTERVAL, self.notify.notified()).await {
                Ok(()) => continue,
                Err(_) => return Some(Event::Heartbeat),
            }
        }
    }
}

/// Per-room registry of live subscriptions.
///
/// The registry lock covers only list mutation; delivery iterates a local
/// copy so a consumer is never enqueued under the lock.
#[derive(Default)]
pub struct Hub {
    rooms: Mutex<HashMap<RoomId, Vec<Arc<Subscription>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }
    /// Register a subscriber. The snapshot notification is queued before
    /// registration, so it strictly precedes any live event.
    pub fn subscribe(&self, room: &RoomId, snapshot: Round) -> Arc<Subscription> {
        let subscription = Arc::new(Subscription::new(room.clone()));
        subscription.push(Event::Notification { game: snapshot });
        self.rooms
            .lock()
            .expect("hub poisoned")
            .entry(room.clone())
            .or_default()
            .push(Arc::clone(&subscription));
        log::debug!("[hub {}] subscribed to room {}", subscription.id, room);
        subscription
    }
    /// Deliver to every open subscriber of the room, dropping closed ones.
    pub fn publish(&self, room: &RoomId, event: Event) {
        let subscribers = {
            let mut rooms = self.rooms.lock().expect("hub poisoned");
            match rooms.get_mut(room) {
                Some(list) => {
                    list.retain(|s| !s.is_closed());
                    list.clone()
                }
                None => return,
            }
        };
        for subscription in subscribers {
            subscription.push(event.clone());
        }
    }
    /// Client disconnect: close, drain, and deregister.
    pub fn unsubscribe(&self, subscription: &Arc<Subscription>) {
        subscription.close();
        subscription.queue.lock().expect("queue poisoned").clear();
        if let Some(list) = self
            .rooms
            .lock()
            .expect("hub poisoned")
            .get_mut(&subscription.room)
        {
            list.retain(|s| s.id != subscription.id);
        }
        log::debug!("[hub {}] unsubscribed", subscription.id);
    }
    /// Close every subscription. Used on shutdown.
    pub fn close_all(&self) {
        let mut rooms = self.rooms.lock().expect("hub poisoned");
        for (_, list) in rooms.drain() {
            for subscription in list {
                subscription.close();
            }
        }
    }
    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.rooms
            .lock()
            .expect("hub poisoned")
            .get(room)
            .map(|list| list.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn room() -> RoomId {
        "SG01".to_string()
    }
    fn snapshot() -> Round {
        Round::new(room(), Utc::now())
    }

    #[tokio::test]
    async fn snapshot_notification_comes_first() {
        let hub = Hub::new();
        let sub = hub.subscribe(&room(), snapshot());
        hub.publish(&room(), Event::Heartbeat);
        match sub.next().await {
            Some(Event::Notification { .. }) => {}
            other => panic!("expected snapshot first, got {:?}", other),
        }
    }
    #[tokio::test]
    async fn events_fan_out_to_all_room_subscribers() {
        let hub = Hub::new();
        let a = hub.subscribe(&room(), snapshot());
        let b = hub.subscribe(&room(), snapshot());
        hub.publish(&room(), Event::Heartbeat);
        assert_eq!(a.depth(), 2);
        assert_eq!(b.depth(), 2);
    }
    #[tokio::test]
    async fn publish_to_foreign_room_is_invisible() {
        let hub = Hub::new();
        let sub = hub.subscribe(&room(), snapshot());
        hub.publish(&"SG02".to_string(), Event::Heartbeat);
        assert_eq!(sub.depth(), 1); // snapshot only
    }
    #[tokio::test]
    async fn slow_consumer_takes_strikes_then_closes() {
        let hub = Hub::new();
        let sub = hub.subscribe(&room(), snapshot());
        // fill to capacity without consuming (snapshot occupies one slot)
        for _ in 0..(SUBSCRIPTION_QUEUE_CAPACITY - 1) {
            hub.publish(&room(), Event::Heartbeat);
        }
        assert_eq!(sub.strikes(), 0);
        // three overflows take strikes, the fourth closes the stream
        for expected in 1..=SLOW_CONSUMER_STRIKES {
            hub.publish(&room(), Event::Heartbeat);
            assert_eq!(sub.strikes(), expected);
            assert!(!sub.is_closed());
        }
        hub.publish(&room(), Event::Heartbeat);
        assert_eq!(sub.strikes(), SLOW_CONSUMER_STRIKES);
        assert!(sub.is_closed());
    }
    #[tokio::test]
    async fn slow_consumer_does_not_affect_neighbours() {
        let hub = Hub::new();
        let slow = hub.subscribe(&room(), snapshot());
        let fast = hub.subscribe(&room(), snapshot());
        for _ in 0..(SUBSCRIPTION_QUEUE_CAPACITY + SLOW_CONSUMER_STRIKES as usize) {
            hub.publish(&room(), Event::Heartbeat);
            while fast.depth() > 0 {
                fast.next().await;
            }
        }
        assert!(slow.is_closed());
        assert!(!fast.is_closed());
        assert_eq!(hub.subscriber_count(&room()), 1);
    }
    #[tokio::test]
    async fn overflow_drops_the_oldest_event() {
        let hub = Hub::new();
        let sub = hub.subscribe(&room(), snapshot());
        for _ in 0..SUBSCRIPTION_QUEUE_CAPACITY {
            hub.publish(&room(), Event::Heartbeat);
        }
        // snapshot was the oldest entry and must have been dropped
        match sub.next().await {
            Some(Event::Heartbeat) => {}
            other => panic!("expected heartbeat, got {:?}", other),
        }
    }
    #[tokio::test]
    async fn unsubscribe_drains_and_removes() {
        let hub = Hub::new();
        let sub = hub.subscribe(&room(), snapshot());
        hub.publish(&room(), Event::Heartbeat);
        hub.unsubscribe(&sub);
        assert_eq!(sub.depth(), 0);
        assert_eq!(hub.subscriber_count(&room()), 0);
        assert_eq!(sub.next().await.map(|e| e.to_string()), None);
    }
}
