//! Terminal front-end for the sensor feed.
//!
//! Wires together everything the feed needs at runtime:
//! - the feed itself (producer + observable state)
//! - a console printer subscribed to every snapshot
//! - stdin commands (toggle, status, quit)
//! - the config file watcher (live reload of simulation settings)

pub mod command;
pub mod render;

pub use command::{parse_command, Command};
pub use render::ConsolePrinter;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use feed_config::{default_path, load as load_config, ConfigWatcher, FeedConfig};
use feed_core::Result;
use feed_sim::SensorFeed;
use tokio::sync::mpsc;
use tracing::{info, warn};

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the console until `q` or Ctrl-C, using the default config path.
pub async fn run() -> Result<()> {
    let path = default_path();
    let config = load_config(&path).unwrap_or_else(|e| {
        warn!("{e}; using defaults");
        FeedConfig::default()
    });
    run_with(config, path).await
}

/// Run the console with an explicit config; `path` is watched for changes.
pub async fn run_with(config: FeedConfig, path: PathBuf) -> Result<()> {
    let mut feed = SensorFeed::new(config)?;
    let printer = Arc::new(ConsolePrinter::stdout(feed.config().display.clone()));
    let subscription = feed.subscribe_observer(printer.clone());
    let (_watcher, mut reloads) = ConfigWatcher::spawn(&path);

    printer.print_message(command::HELP);
    feed.start();

    let mut commands = spawn_stdin_reader();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = commands.recv(), if stdin_open => match line {
                Some(line) => match parse_command(&line) {
                    Command::Toggle  => { feed.toggle(); }
                    Command::Status  => printer.print_status(&feed.snapshot()),
                    Command::Help    => printer.print_message(command::HELP),
                    Command::Quit    => break,
                    Command::Unknown(raw) => warn!("Unknown command '{raw}'; type 'h' for help"),
                },
                None => {
                    info!("stdin closed; press Ctrl-C to exit");
                    stdin_open = false;
                }
            },
            Some(()) = reloads.recv() => reload(&mut feed, &printer, &path),
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    feed.unsubscribe(subscription);
    feed.stop().await;
    Ok(())
}

fn reload(feed: &mut SensorFeed, printer: &ConsolePrinter, path: &Path) {
    match load_config(path) {
        Ok(config) => {
            printer.set_display(config.display.clone());
            match feed.apply(config) {
                Ok(()) => info!("Config reloaded"),
                Err(e) => warn!("Config reload rejected: {e}"),
            }
        }
        Err(e) => warn!("Config reload failed: {e}"),
    }
}

/// Read stdin on a detached thread and forward each line. The thread must
/// never hold up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    use std::io::BufRead;

    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break; // receiver dropped
                    }
                }
                Err(e) => {
                    warn!("Cannot read stdin: {e}");
                    break;
                }
            }
        }
    });
    rx
}
