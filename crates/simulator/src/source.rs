use chrono::Local;
use feed_config::SimulationConfig;
use feed_core::Reading;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Anything that can produce the next reading on a simulator tick.
///
/// Generation never fails; a source that has nothing better to say still
/// returns a reading.
pub trait ReadingSource: Send + 'static {
    fn next_reading(&mut self) -> Reading;

    /// Apply new simulation settings. Sources without tunables ignore this.
    fn reconfigure(&mut self, _config: &SimulationConfig) {}
}

/// Uniformly distributed values in `[min_value, max_value)`, stamped with the
/// local wall-clock time.
#[derive(Debug)]
pub struct RandomSource {
    rng:              StdRng,
    min_value:        f64,
    max_value:        f64,
    timestamp_format: String,
}

impl RandomSource {
    pub fn new(config: &SimulationConfig) -> Self {
        Self::from_rng(StdRng::from_os_rng(), config)
    }

    /// Deterministic source for reproducible runs.
    pub fn seeded(seed: u64, config: &SimulationConfig) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), config)
    }

    fn from_rng(rng: StdRng, config: &SimulationConfig) -> Self {
        assert!(
            config.min_value < config.max_value,
            "simulation range must be non-empty"
        );
        Self {
            rng,
            min_value:        config.min_value,
            max_value:        config.max_value,
            timestamp_format: config.timestamp_format.clone(),
        }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_value, self.max_value)
    }
}

impl ReadingSource for RandomSource {
    fn next_reading(&mut self) -> Reading {
        let value = self.rng.random_range(self.min_value..self.max_value);
        Reading::with_format(value, Local::now(), &self.timestamp_format)
    }

    fn reconfigure(&mut self, config: &SimulationConfig) {
        if config.min_value < config.max_value {
            self.min_value = config.min_value;
            self.max_value = config.max_value;
        }
        self.timestamp_format = config.timestamp_format.clone();
    }
}
