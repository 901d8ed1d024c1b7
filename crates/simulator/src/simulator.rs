use std::sync::Arc;
use std::time::Duration;

use feed_core::ObservableState;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::source::ReadingSource;

/// Source shared between successive producer tasks, so a resumed feed keeps
/// drawing from the same generator.
pub type SharedSource = Arc<Mutex<Box<dyn ReadingSource>>>;

/// Handle to one running producer task.
///
/// Cancelling is cooperative: the task stops at its next wait boundary and
/// never pushes a reading once the token is cancelled.
#[derive(Debug)]
pub struct SimulatorHandle {
    token:  CancellationToken,
    handle: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Spawn a producer on `runtime` that pushes one reading into `state`
    /// immediately and then every `interval`.
    pub fn spawn(
        runtime: &Handle,
        state: Arc<ObservableState>,
        source: SharedSource,
        interval: Duration,
    ) -> Self {
        let token = CancellationToken::new();
        let handle = runtime.spawn(run(state, source, interval, token.clone()));
        Self { token, handle }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the task to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!("Simulator task ended abnormally: {e}");
        }
    }
}

async fn run(
    state: Arc<ObservableState>,
    source: SharedSource,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let reading = source.lock().next_reading();
        match state.push_unless_cancelled(reading, &token) {
            Some(snapshot) => debug!(
                value = ?snapshot.aggregates.current,
                len = snapshot.readings.len(),
                "tick"
            ),
            None => break,
        }
    }

    debug!("simulator stopped");
}
