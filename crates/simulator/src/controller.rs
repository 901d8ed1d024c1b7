//! Start/stop/toggle over the simulator with a single-flight guarantee.

use std::sync::Arc;
use std::time::Duration;

use feed_config::SimulationConfig;
use feed_core::{FeedError, ObservableState, Result, RunState};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::info;

use crate::simulator::{SharedSource, SimulatorHandle};

struct Inner {
    interval: Duration,
    /// The only producer allowed to exist. `Some` exactly while running.
    active:   Option<SimulatorHandle>,
}

/// Owns the producer lifecycle and publishes [`RunState`] changes.
///
/// Every transition happens under one mutex, so concurrent `toggle` calls are
/// serialised and can never leave two producers alive. Pausing cancels the
/// producer before `Paused` is published, and the producer checks its token
/// under the state lock, so no reading lands after observers see `Paused`.
pub struct RunController {
    state:   Arc<ObservableState>,
    source:  SharedSource,
    runtime: Handle,
    inner:   Mutex<Inner>,
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("RunController")
            .field("interval", &inner.interval)
            .field("active", &inner.active.is_some())
            .finish()
    }
}

impl RunController {
    /// Create an idle controller bound to the current Tokio runtime.
    pub fn new(state: Arc<ObservableState>, source: SharedSource, interval: Duration) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| FeedError::Runtime(format!("run controller needs a Tokio runtime: {e}")))?;
        Ok(Self {
            state,
            source,
            runtime,
            inner: Mutex::new(Inner {
                interval,
                active: None,
            }),
        })
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.inner.lock().interval
    }

    /// Begin producing. No-op if already running.
    pub fn start(&self) -> RunState {
        let mut inner = self.inner.lock();
        self.start_locked(&mut inner)
    }

    /// Stop producing but keep the window. No-op unless running.
    pub fn pause(&self) -> RunState {
        let mut inner = self.inner.lock();
        self.pause_locked(&mut inner)
    }

    /// Running → Paused, Paused or Idle → Running. Returns the new state.
    pub fn toggle(&self) -> RunState {
        let mut inner = self.inner.lock();
        if inner.active.is_some() {
            self.pause_locked(&mut inner)
        } else {
            self.start_locked(&mut inner)
        }
    }

    /// Cancel the producer, publish [`RunState::Idle`] and wait for the task to exit.
    pub async fn stop(&self) {
        let retired = {
            let mut inner = self.inner.lock();
            let retired = inner.active.take();
            if let Some(sim) = &retired {
                sim.cancel();
            }
            self.state.set_run_state(RunState::Idle);
            retired
        };
        if let Some(sim) = retired {
            sim.shutdown().await;
            info!("Feed stopped");
        }
    }

    /// Apply new simulation settings. A running producer is replaced so the
    /// new interval takes effect; the replacement ticks immediately.
    pub fn reconfigure(&self, config: &SimulationConfig) {
        let mut inner = self.inner.lock();
        inner.interval = config.interval();
        self.source.lock().reconfigure(config);

        if let Some(old) = inner.active.take() {
            old.cancel();
            inner.active = Some(self.spawn(inner.interval));
        }
        info!(
            interval_ms = config.interval_ms,
            min = config.min_value,
            max = config.max_value,
            "Simulation reconfigured"
        );
    }

    fn start_locked(&self, inner: &mut Inner) -> RunState {
        if inner.active.is_none() {
            // Published first: the new producer's first tick can land at once.
            self.state.set_run_state(RunState::Running);
            inner.active = Some(self.spawn(inner.interval));
            info!(interval_ms = inner.interval.as_millis() as u64, "Feed running");
        }
        RunState::Running
    }

    fn pause_locked(&self, inner: &mut Inner) -> RunState {
        match inner.active.take() {
            Some(sim) => {
                sim.cancel();
                self.state.set_run_state(RunState::Paused);
                info!("Feed paused");
                RunState::Paused
            }
            None => self.state.run_state(),
        }
    }

    fn spawn(&self, interval: Duration) -> SimulatorHandle {
        SimulatorHandle::spawn(
            &self.runtime,
            Arc::clone(&self.state),
            Arc::clone(&self.source),
            interval,
        )
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        if let Some(sim) = self.inner.get_mut().active.take() {
            sim.cancel();
        }
    }
}
