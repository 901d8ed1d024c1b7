use chrono::{DateTime, Local};
use serde::Serialize;

use crate::aggregate::Aggregates;

/// Display format used for [`Reading::timestamp`] unless configured otherwise.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// A single immutable sensor measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    value:       f64,
    captured_at: DateTime<Local>,
    /// Capture time rendered for display, e.g. `"14:03:27"`.
    timestamp:   String,
}

impl Reading {
    /// Build a reading stamped with [`DEFAULT_TIMESTAMP_FORMAT`].
    pub fn new(value: f64, captured_at: DateTime<Local>) -> Self {
        Self::with_format(value, captured_at, DEFAULT_TIMESTAMP_FORMAT)
    }

    /// Build a reading whose display timestamp uses a `chrono` format string.
    pub fn with_format(value: f64, captured_at: DateTime<Local>, format: &str) -> Self {
        Self {
            value,
            captured_at,
            timestamp: captured_at.format(format).to_string(),
        }
    }

    /// Raw, un-rounded measurement.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    #[must_use]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Lifecycle of the producer as seen by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Not started yet, or stopped.
    #[default]
    Idle,
    Running,
    Paused,
}

impl RunState {
    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Idle    => "idle",
            Self::Running => "running",
            Self::Paused  => "paused",
        }
    }
}

/// Everything a consumer sees at one point in time.
///
/// `aggregates` is always computed from exactly these `readings`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    /// Window contents, newest first.
    pub readings:   Vec<Reading>,
    pub aggregates: Aggregates,
    pub run_state:  RunState,
    /// Window capacity the readings are bounded by.
    pub capacity:   usize,
    /// Total readings pushed since the state was created (including evicted ones).
    pub produced:   u64,
    /// Publication counter; grows by one on every published change.
    pub revision:   u64,
}

impl FeedSnapshot {
    /// The initial, empty snapshot published before anything happens.
    pub fn empty(capacity: usize) -> Self {
        Self {
            readings:   Vec::new(),
            aggregates: Aggregates::default(),
            run_state:  RunState::Idle,
            capacity,
            produced:   0,
            revision:   0,
        }
    }

    #[must_use]
    pub fn newest(&self) -> Option<&Reading> {
        self.readings.first()
    }

    /// Window values, newest first.
    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(Reading::value).collect()
    }
}
