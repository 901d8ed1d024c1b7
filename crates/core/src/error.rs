use thiserror::Error;

/// Top-level error type used across the feed crates.
///
/// Producing, windowing and aggregating readings cannot fail; these variants
/// cover the surroundings (configuration, runtime wiring, I/O).
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = FeedError> = std::result::Result<T, E>;
