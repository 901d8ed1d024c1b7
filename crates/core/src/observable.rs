//! Replay-latest broadcast of the feed state.
//!
//! [`ObservableState`] owns the only mutable copy of the window. Every
//! mutation recomputes the aggregates, bumps the revision and publishes the
//! resulting [`FeedSnapshot`] under one lock, so no observer can see a window
//! without its matching aggregates.
//!
//! Two delivery styles are offered:
//! - callbacks ([`ObservableState::subscribe`]), invoked synchronously in
//!   publication order, with the latest snapshot replayed on subscribe;
//! - a `tokio::sync::watch` receiver ([`ObservableState::watch`]) for async
//!   consumers that only care about the most recent value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::aggregate::Aggregates;
use crate::observer::FeedObserver;
use crate::state::{FeedSnapshot, Reading, RunState};
use crate::window::BoundedWindow;

type Callback = Arc<dyn Fn(&FeedSnapshot) + Send + Sync>;

/// Handle returned by [`ObservableState::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Core {
    window:    BoundedWindow,
    run_state: RunState,
    produced:  u64,
    revision:  u64,
}

impl Core {
    fn snapshot(&self) -> FeedSnapshot {
        let readings = self.window.snapshot();
        FeedSnapshot {
            aggregates: Aggregates::compute(&readings),
            readings,
            run_state:  self.run_state,
            capacity:   self.window.capacity(),
            produced:   self.produced,
            revision:   self.revision,
        }
    }
}

pub struct ObservableState {
    core:        Mutex<Core>,
    latest:      watch::Sender<Arc<FeedSnapshot>>,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_id:     AtomicU64,
    /// Serialises deliveries. Re-entrant so callbacks may subscribe,
    /// unsubscribe or read the snapshot.
    delivery:    ReentrantMutex<()>,
}

impl Default for ObservableState {
    fn default() -> Self {
        Self::new(BoundedWindow::default())
    }
}

impl std::fmt::Debug for ObservableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableState")
            .field("snapshot", &self.snapshot())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ObservableState {
    pub fn new(window: BoundedWindow) -> Self {
        let initial = Arc::new(FeedSnapshot::empty(window.capacity()));
        let (latest, _) = watch::channel(initial);
        Self {
            core: Mutex::new(Core {
                window,
                run_state: RunState::Idle,
                produced:  0,
                revision:  0,
            }),
            latest,
            subscribers: Mutex::new(Vec::new()),
            next_id:     AtomicU64::new(0),
            delivery:    ReentrantMutex::new(()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(BoundedWindow::with_capacity(capacity))
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.latest.borrow().clone()
    }

    pub fn run_state(&self) -> RunState {
        self.latest.borrow().run_state
    }

    /// Async view of the latest snapshot. Dropping the receiver unsubscribes.
    pub fn watch(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.latest.subscribe()
    }

    /// [`Self::watch`] as a `Stream` that yields the current snapshot first.
    pub fn updates(&self) -> WatchStream<Arc<FeedSnapshot>> {
        WatchStream::new(self.watch())
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    // ── Subscriptions ────────────────────────────────────────────────────────

    /// Register `callback`. It runs immediately with the latest snapshot and
    /// then once per publication, in order, until [`Self::unsubscribe`].
    ///
    /// Callbacks run on the publishing thread. They may read the state and
    /// manage subscriptions, but must not drive the run controller that is
    /// publishing to them.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FeedSnapshot) + Send + Sync + 'static,
    {
        let _delivery = self.delivery.lock();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Callback = Arc::new(callback);
        self.subscribers.lock().push((id, Arc::clone(&callback)));
        debug!(?id, "subscriber added");

        let latest = self.snapshot();
        callback(&latest);
        id
    }

    /// Register a [`FeedObserver`]; same delivery rules as [`Self::subscribe`].
    pub fn subscribe_observer(&self, observer: Arc<dyn FeedObserver>) -> SubscriptionId {
        debug!(observer = observer.name(), "observer attached");
        self.subscribe(move |snapshot| observer.on_snapshot(snapshot))
    }

    /// Stop deliveries to `id`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        let removed = subscribers.len() != before;
        if removed {
            debug!(?id, "subscriber removed");
        }
        removed
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    /// Push a reading into the window and publish.
    pub fn push(&self, reading: Reading) -> Arc<FeedSnapshot> {
        self.publish_with(|core| {
            core.window.push(reading);
            core.produced += 1;
            true
        })
        .unwrap_or_else(|| self.snapshot())
    }

    /// Like [`Self::push`], but does nothing once `token` is cancelled.
    ///
    /// The token is checked under the state lock, so a producer cancelled
    /// before a run-state change is published can never write after it.
    pub fn push_unless_cancelled(
        &self,
        reading: Reading,
        token: &CancellationToken,
    ) -> Option<Arc<FeedSnapshot>> {
        self.publish_with(|core| {
            if token.is_cancelled() {
                return false;
            }
            core.window.push(reading);
            core.produced += 1;
            true
        })
    }

    /// Publish a new run state. No-op (returns `None`) if it is unchanged.
    pub fn set_run_state(&self, run_state: RunState) -> Option<Arc<FeedSnapshot>> {
        self.publish_with(|core| {
            if core.run_state == run_state {
                return false;
            }
            core.run_state = run_state;
            true
        })
    }

    fn publish_with(&self, mutate: impl FnOnce(&mut Core) -> bool) -> Option<Arc<FeedSnapshot>> {
        let _delivery = self.delivery.lock();

        let snapshot = {
            let mut core = self.core.lock();
            if !mutate(&mut core) {
                return None;
            }
            core.revision += 1;
            let snapshot = Arc::new(core.snapshot());
            self.latest.send_replace(Arc::clone(&snapshot));
            snapshot
        };

        trace!(revision = snapshot.revision, len = snapshot.readings.len(), "published");
        self.deliver(&snapshot);
        Some(snapshot)
    }

    fn deliver(&self, snapshot: &FeedSnapshot) {
        let ids: Vec<SubscriptionId> = self.subscribers.lock().iter().map(|(id, _)| *id).collect();
        for id in ids {
            // Re-check membership so a subscriber removed mid-delivery gets nothing more.
            let callback = self
                .subscribers
                .lock()
                .iter()
                .find(|(sid, _)| *sid == id)
                .map(|(_, cb)| Arc::clone(cb));
            if let Some(callback) = callback {
                callback(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use futures::StreamExt;

    fn reading(value: f64) -> Reading {
        Reading::new(value, Local::now())
    }

    fn recorder() -> (Arc<Mutex<Vec<FeedSnapshot>>>, impl Fn(&FeedSnapshot) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |snap: &FeedSnapshot| sink.lock().push(snap.clone()))
    }

    #[test]
    fn subscribe_replays_latest() {
        let state = ObservableState::default();
        state.push(reading(70.0));
        state.push(reading(72.0));

        let (seen, cb) = recorder();
        state.subscribe(cb);

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].values(), vec![72.0, 70.0]);
        assert_eq!(seen[0].revision, 2);
    }

    #[test]
    fn aggregates_match_window_in_every_publication() {
        let state = ObservableState::default();
        let (seen, cb) = recorder();
        state.subscribe(cb);

        for v in [70.0, 72.0, 68.0] {
            state.push(reading(v));
        }

        let seen = seen.lock();
        assert_eq!(seen.len(), 4);
        for snap in seen.iter() {
            assert_eq!(snap.aggregates, Aggregates::compute(&snap.readings));
        }
        let last = seen.last().unwrap();
        assert_eq!(last.values(), vec![68.0, 72.0, 70.0]);
        assert_eq!(last.aggregates.current, Some(68.0));
        assert_eq!(last.aggregates.min, Some(68.0));
        assert_eq!(last.aggregates.max, Some(72.0));
        assert_eq!(last.aggregates.average, Some(70.0));
    }

    #[test]
    fn revisions_are_consecutive() {
        let state = ObservableState::default();
        let (seen, cb) = recorder();
        state.subscribe(cb);

        state.push(reading(1.0));
        state.set_run_state(RunState::Running);
        state.push(reading(2.0));
        state.set_run_state(RunState::Paused);

        let revisions: Vec<u64> = seen.lock().iter().map(|s| s.revision).collect();
        assert_eq!(revisions, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn unchanged_run_state_is_not_published() {
        let state = ObservableState::default();
        assert!(state.set_run_state(RunState::Running).is_some());
        assert!(state.set_run_state(RunState::Running).is_none());
        assert_eq!(state.snapshot().revision, 1);
    }

    #[test]
    fn unsubscribe_one_of_two_keeps_the_other() {
        let state = ObservableState::default();
        let (first, cb1) = recorder();
        let (second, cb2) = recorder();
        let id1 = state.subscribe(cb1);
        state.subscribe(cb2);

        assert!(state.unsubscribe(id1));
        assert!(!state.unsubscribe(id1));
        state.push(reading(75.0));

        assert_eq!(first.lock().len(), 1);
        assert_eq!(second.lock().len(), 2);
        assert_eq!(state.subscriber_count(), 1);
    }

    #[test]
    fn cancelled_token_blocks_push() {
        let state = ObservableState::default();
        let token = CancellationToken::new();
        assert!(state.push_unless_cancelled(reading(70.0), &token).is_some());

        token.cancel();
        assert!(state.push_unless_cancelled(reading(71.0), &token).is_none());
        let snap = state.snapshot();
        assert_eq!(snap.values(), vec![70.0]);
        assert_eq!(snap.produced, 1);
    }

    #[test]
    fn subscribe_from_inside_a_callback() {
        let state = Arc::new(ObservableState::default());
        let (inner_seen, inner_cb) = recorder();
        let inner_cb = Arc::new(inner_cb);

        let weak = Arc::downgrade(&state);
        let installed = Arc::new(Mutex::new(false));
        state.subscribe(move |snap| {
            if snap.produced == 1 && !*installed.lock() {
                *installed.lock() = true;
                if let Some(state) = weak.upgrade() {
                    let cb = Arc::clone(&inner_cb);
                    state.subscribe(move |s| cb(s));
                }
            }
        });

        state.push(reading(1.0));
        state.push(reading(2.0));

        let produced: Vec<u64> = inner_seen.lock().iter().map(|s| s.produced).collect();
        assert_eq!(produced, vec![1, 2]);
    }

    #[test]
    fn snapshot_reads_from_callback_see_the_published_value() {
        let state = Arc::new(ObservableState::default());
        let weak = Arc::downgrade(&state);
        let mismatches = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&mismatches);
        state.subscribe(move |snap| {
            if let Some(state) = weak.upgrade() {
                if state.snapshot().revision != snap.revision {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        for v in 0..5 {
            state.push(reading(f64::from(v)));
        }
        assert_eq!(mismatches.load(Ordering::Relaxed), 0);
    }

    struct Counting(AtomicU64);

    impl FeedObserver for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn on_snapshot(&self, _snapshot: &FeedSnapshot) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn observer_trait_objects_receive_updates() {
        let state = ObservableState::default();
        let observer = Arc::new(Counting(AtomicU64::new(0)));
        state.subscribe_observer(observer.clone());
        state.push(reading(1.0));
        assert_eq!(observer.0.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn updates_stream_starts_with_latest() {
        let state = ObservableState::default();
        state.push(reading(70.0));

        let mut updates = state.updates();
        let first = updates.next().await.unwrap();
        assert_eq!(first.values(), vec![70.0]);

        state.push(reading(71.0));
        let next = updates.next().await.unwrap();
        assert_eq!(next.values(), vec![71.0, 70.0]);
    }

    #[tokio::test]
    async fn watch_receiver_sees_latest_only() {
        let state = ObservableState::default();
        let mut rx = state.watch();
        for v in 0..5 {
            state.push(reading(f64::from(v)));
        }
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().produced, 5);
    }
}
