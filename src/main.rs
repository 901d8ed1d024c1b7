//! sensorfeed: a simulated live sensor feed with rolling statistics.
//!
//! Run with:  `RUST_LOG=info sensorfeed`

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    // Logs go to stderr so stdout carries only feed lines.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("sensorfeed v{} starting", env!("CARGO_PKG_VERSION"));

    feed_console::run().await.map_err(Into::into)
}
