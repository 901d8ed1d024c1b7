use feed_core::{FeedError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure parsed from `sensorfeed.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// How readings are generated.
    pub simulation: SimulationConfig,
    /// Size of the rolling window.
    pub window: WindowConfig,
    /// How the console renders snapshots.
    pub display: DisplayConfig,
}

impl FeedConfig {
    /// Reject settings that would break the feed's invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if self.window.capacity == 0 {
            return Err(FeedError::Config("window.capacity must be at least 1".into()));
        }
        if self.display.decimals > 6 {
            return Err(FeedError::Config(format!(
                "display.decimals must be at most 6, got {}",
                self.display.decimals
            )));
        }
        Ok(())
    }
}

/// Producer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Delay between two readings, in milliseconds.
    pub interval_ms: u64,
    /// Inclusive lower bound of simulated values.
    pub min_value: f64,
    /// Exclusive upper bound of simulated values.
    pub max_value: f64,
    /// `chrono` format string for reading timestamps.
    pub timestamp_format: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms:      2_000,
            min_value:        65.0,
            max_value:        85.0,
            timestamp_format: feed_core::state::DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl SimulationConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(FeedError::Config("simulation.interval_ms must be positive".into()));
        }
        if !self.min_value.is_finite() || !self.max_value.is_finite() {
            return Err(FeedError::Config("simulation value bounds must be finite".into()));
        }
        if self.min_value >= self.max_value {
            return Err(FeedError::Config(format!(
                "simulation.min_value ({}) must be below max_value ({})",
                self.min_value, self.max_value
            )));
        }
        if self.timestamp_format.is_empty() {
            return Err(FeedError::Config("simulation.timestamp_format is empty".into()));
        }
        Ok(())
    }
}

/// Rolling window settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of readings kept; the oldest is evicted beyond this.
    pub capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: feed_core::window::DEFAULT_CAPACITY,
        }
    }
}

/// Console output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub format: OutputFormat,
    /// Digits after the decimal point when printing values.
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format:   OutputFormat::Text,
            decimals: 1,
        }
    }
}

/// Console line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per snapshot.
    Json,
}
