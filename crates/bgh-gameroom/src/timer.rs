use bgh_core::ID;
use bgh_game::Round;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

struct Entry {
    generation: u64,
    handle: tokio::task::JoinHandle<()>,
}

/// Per-round registry of deferred auto-advance tasks.
///
/// `schedule` replaces any outstanding entry for the round; the replaced
/// task is cancelled and never runs. A fired task re-checks that it is
/// still the registered generation under the registry mutex before it may
/// run, so a concurrent `cancel` that reaches the mutex first suppresses
/// it. The manager's timed entry point re-validates the armed stage under
/// the room lock, closing the window where a task fires between the cancel
/// decision and lock acquisition.
#[derive(Default)]
pub struct TimerSupervisor {
    entries: Arc<Mutex<HashMap<ID<Round>, Entry>>>,
    counter: AtomicU64,
}

impl TimerSupervisor {
    pub fn new() -> Self {
        Self::default()
    }
    /// Run `task` after `delay` unless cancelled or replaced first.
    pub fn schedule<F, Fut>(&self, round: ID<Round>, delay: Duration, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let registry = Arc::clone(&self.entries);
        let mut entries = self.entries.lock().expect("timer registry poisoned");
        if let Some(prev) = entries.remove(&round) {
            prev.handle.abort();
        }
        // the registry lock is held across spawn, so the new task cannot
        // observe the map before its own entry is inserted
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut entries = registry.lock().expect("timer registry poisoned");
                match entries.get(&round) {
                    Some(entry) if entry.generation == generation => {
                        entries.remove(&round);
                    }
                    _ => return,
                }
            }
            task().await;
        });
        entries.insert(round, Entry { generation, handle });
        log::debug!("[timer] scheduled {} in {:?}", round, delay);
    }
    /// Idempotent: cancelling an absent or already-fired entry is a no-op.
    pub fn cancel(&self, round: ID<Round>) {
        if let Some(entry) = self
            .entries
            .lock()
            .expect("timer registry poisoned")
            .remove(&round)
        {
            entry.handle.abort();
            log::debug!("[timer] cancelled {}", round);
        }
    }
    pub fn is_scheduled(&self, round: ID<Round>) -> bool {
        self.entries
            .lock()
            .expect("timer registry poisoned")
            .contains_key(&round)
    }
    /// Abort everything outstanding. Used on shutdown.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("timer registry poisoned");
        for (_, entry) in entries.drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn bump(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn fired_task_runs_and_leaves_the_registry() {
        let timers = TimerSupervisor::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let round = ID::default();
        timers.schedule(round, Duration::from_millis(10), bump(&fired));
        assert!(timers.is_scheduled(round));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timers.is_scheduled(round));
    }
    #[tokio::test]
    async fn replace_cancels_the_prior_task() {
        let timers = TimerSupervisor::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let round = ID::default();
        timers.schedule(round, Duration::from_millis(10), bump(&fired));
        timers.schedule(round, Duration::from_millis(30), bump(&fired));
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
    #[tokio::test]
    async fn cancel_is_idempotent_and_prevents_firing() {
        let timers = TimerSupervisor::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let round = ID::default();
        timers.schedule(round, Duration::from_millis(20), bump(&fired));
        timers.cancel(round);
        timers.cancel(round);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
    #[tokio::test]
    async fn independent_rounds_fire_independently() {
        let timers = TimerSupervisor::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let a = ID::default();
        let b = ID::default();
        timers.schedule(a, Duration::from_millis(10), bump(&fired));
        timers.schedule(b, Duration::from_millis(10), bump(&fired));
        timers.cancel(a);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
    #[tokio::test]
    async fn clear_aborts_everything() {
        let timers = TimerSupervisor::new();
        let fired = Arc::new(AtomicUsize::new(0));
        timers.schedule(ID::default(), Duration::from_millis(10), bump(&fired));
        timers.schedule(ID::default(), Duration::from_millis(10), bump(&fired));
        timers.clear();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
