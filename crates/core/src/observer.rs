use crate::state::FeedSnapshot;

/// A consumer that reacts to published feed snapshots.
///
/// Observers are purely reactive: they receive a read-only snapshot and own
/// whatever presentation they do with it. Delivery is synchronous on the
/// publishing thread, so implementations should return quickly.
pub trait FeedObserver: Send + Sync {
    /// Short identifier used in logs, e.g. `"console"`.
    fn name(&self) -> &str;

    /// Called once with the latest snapshot on subscription, then on every change.
    fn on_snapshot(&self, snapshot: &FeedSnapshot);
}
