use std::sync::Arc;

use feed_config::{FeedConfig, SimulationConfig};
use feed_core::{
    FeedObserver, FeedSnapshot, ObservableState, Result, RunState, SubscriptionId,
};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

use crate::controller::RunController;
use crate::source::{RandomSource, ReadingSource};

/// The assembled feed: observable state plus the controller that drives it.
///
/// Nothing runs until [`SensorFeed::start`]; whoever owns the feed decides
/// its lifetime and should call [`SensorFeed::stop`] before dropping it.
#[derive(Debug)]
pub struct SensorFeed {
    config:     FeedConfig,
    state:      Arc<ObservableState>,
    controller: RunController,
}

impl SensorFeed {
    /// Build a feed drawing uniform random readings. Must be called inside a
    /// Tokio runtime.
    pub fn new(config: FeedConfig) -> Result<Self> {
        config.validate()?;
        let source = RandomSource::new(&config.simulation);
        Self::with_source(config, source)
    }

    /// Build a feed around a custom [`ReadingSource`].
    pub fn with_source(config: FeedConfig, source: impl ReadingSource) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(ObservableState::with_capacity(config.window.capacity));
        let source: Box<dyn ReadingSource> = Box::new(source);
        let controller = RunController::new(
            Arc::clone(&state),
            Arc::new(Mutex::new(source)),
            config.simulation.interval(),
        )?;
        Ok(Self {
            config,
            state,
            controller,
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Shared handle to the observable state, for consumers that outlive a borrow.
    pub fn state(&self) -> Arc<ObservableState> {
        Arc::clone(&self.state)
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    pub fn start(&self) -> RunState {
        self.controller.start()
    }

    pub fn pause(&self) -> RunState {
        self.controller.pause()
    }

    pub fn toggle(&self) -> RunState {
        self.controller.toggle()
    }

    pub async fn stop(&self) {
        self.controller.stop().await;
    }

    pub fn run_state(&self) -> RunState {
        self.controller.run_state()
    }

    /// Apply new simulation settings without touching the window.
    pub fn reconfigure(&mut self, simulation: SimulationConfig) -> Result<()> {
        simulation.validate()?;
        if simulation == self.config.simulation {
            return Ok(());
        }
        self.controller.reconfigure(&simulation);
        self.config.simulation = simulation;
        Ok(())
    }

    /// Apply a reloaded configuration. Settings that need a fresh window are
    /// reported and left unchanged.
    pub fn apply(&mut self, config: FeedConfig) -> Result<()> {
        config.validate()?;
        if config.window.capacity != self.config.window.capacity {
            warn!(
                current = self.config.window.capacity,
                requested = config.window.capacity,
                "Window capacity changes take effect after a restart"
            );
        }
        self.reconfigure(config.simulation)?;
        self.config.display = config.display;
        Ok(())
    }

    // ── Observation ──────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.state.snapshot()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&FeedSnapshot) + Send + Sync + 'static,
    {
        self.state.subscribe(callback)
    }

    pub fn subscribe_observer(&self, observer: Arc<dyn FeedObserver>) -> SubscriptionId {
        self.state.subscribe_observer(observer)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn watch(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.state.watch()
    }

    pub fn updates(&self) -> WatchStream<Arc<FeedSnapshot>> {
        self.state.updates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::CountingSource;
    use feed_core::{Aggregates, FeedError};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::time::sleep;

    fn feed() -> SensorFeed {
        SensorFeed::with_source(FeedConfig::default(), CountingSource::default()).unwrap()
    }

    #[test]
    fn new_outside_runtime_is_an_error() {
        let result = SensorFeed::new(FeedConfig::default());
        assert!(matches!(result, Err(FeedError::Runtime(_))));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = FeedConfig::default();
        config.window.capacity = 0;
        assert!(matches!(SensorFeed::new(config), Err(FeedError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn starts_running_and_fills_window() {
        let feed = feed();
        assert_eq!(feed.run_state(), RunState::Idle);
        assert_eq!(feed.start(), RunState::Running);

        // 21 ticks: the first immediately, then one every 2s.
        sleep(Duration::from_millis(40_001)).await;
        let snap = feed.snapshot();
        assert_eq!(snap.produced, 21);
        assert_eq!(snap.readings.len(), 20);
        assert!(!snap.values().contains(&1.0));
        let expected: Vec<f64> = (2..=21).rev().map(f64::from).collect();
        assert_eq!(snap.values(), expected);
        assert_eq!(snap.aggregates, Aggregates::compute(&snap.readings));

        feed.stop().await;
        assert_eq!(feed.run_state(), RunState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn two_subscribers_one_unsubscribed() {
        let feed = feed();
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));
        let (a, b) = (Arc::clone(&first), Arc::clone(&second));
        let id = feed.subscribe(move |_| *a.lock() += 1);
        feed.subscribe(move |_| *b.lock() += 1);
        feed.unsubscribe(id);

        feed.start();
        sleep(Duration::from_millis(2_001)).await;
        feed.stop().await;

        // replay + Running + two ticks + Idle
        assert_eq!(*first.lock(), 1);
        assert_eq!(*second.lock(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn updates_stream_observes_each_tick() {
        let feed = feed();
        let mut updates = feed.updates();
        assert_eq!(updates.next().await.unwrap().revision, 0);

        feed.start();
        let running = updates.next().await.unwrap();
        assert_eq!(running.run_state, RunState::Running);

        let tick = updates.next().await.unwrap();
        assert_eq!(tick.aggregates.current, Some(1.0));
        feed.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reconfigure_rejects_bad_settings() {
        let mut feed = feed();
        let bad = SimulationConfig {
            interval_ms: 0,
            ..SimulationConfig::default()
        };
        assert!(feed.reconfigure(bad).is_err());
        assert_eq!(feed.config().simulation, SimulationConfig::default());
    }

    #[tokio::test(start_paused = true)]
    async fn apply_keeps_capacity_but_updates_interval() {
        let mut feed = feed();
        let mut reloaded = FeedConfig::default();
        reloaded.window.capacity = 5;
        reloaded.simulation.interval_ms = 250;

        feed.apply(reloaded).unwrap();
        assert_eq!(feed.config().window.capacity, 20);
        assert_eq!(feed.config().simulation.interval_ms, 250);
        assert_eq!(feed.snapshot().capacity, 20);
    }
}
