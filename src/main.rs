//! # Dawn Link
//!
//! Serial telemetry link between a New Dawn guidance unit and a display gateway.
//!
//! Reads Machine Status frames from the New Dawn UART, keeps the latest state
//! for the display and answers handshakes.

use anyhow::{Context, Result};
use std::path::Path;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dawn_link::clock::Clock;
use dawn_link::config::{Config, LoggingConfig};
use dawn_link::link::{LinkDriver, LinkSettings};
use dawn_link::serial::SerialTransport;
use dawn_link::telemetry::TelemetryStore;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name prefix inside `logging.log_dir`
const LOG_FILE_PREFIX: &str = "dawn-link.log";

/// Main entry point for Dawn Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (argument, `config/default.toml`, or built-in defaults)
///    - Set up logging with tracing subscriber
///    - Open the serial connection to the New Dawn unit
///
/// 2. **Main Loop**
///    - Link driver reads, frames and dispatches incoming bytes
///    - Display consumer task renders the telemetry view
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - The serial port cannot be opened
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let (config, config_source) = load_config()?;
    let _log_guard = init_logging(&config.logging);

    info!("Dawn Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_source);

    let serial = SerialTransport::open(&config.serial.port, config.serial.baud_rate)
        .with_context(|| format!("opening {}", config.serial.port))?;

    let clock = Clock::start();
    let store = TelemetryStore::new(config.link.store_lock_timeout());
    let mut driver = LinkDriver::new(serial, store.clone(), clock, LinkSettings::from(&config));

    let refresh = Duration::from_millis(config.display.refresh_interval_ms);
    let display = tokio::spawn(run_display_consumer(store, clock, refresh));

    info!("Press Ctrl+C to exit");

    tokio::select! {
        _ = driver.run() => {}

        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    display.abort();
    info!(stats = ?driver.stats(), "Link stopped");

    Ok(())
}

/// Pick the configuration: explicit path, default file, or built-in defaults
fn load_config() -> Result<(Config, String)> {
    if let Some(path) = std::env::args().nth(1) {
        let config = Config::load(&path).with_context(|| format!("loading {}", path))?;
        return Ok((config, path));
    }

    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        let config = Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH))?;
        return Ok((config, DEFAULT_CONFIG_PATH.to_string()));
    }

    Ok((Config::default(), "built-in defaults".to_string()))
}

/// Install console logging plus an optional daily-rolling file
///
/// `RUST_LOG` takes precedence over the configured level. The returned guard
/// flushes the file writer on drop.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Stand-in for the display: renders the telemetry view as JSON
async fn run_display_consumer(store: TelemetryStore, clock: Clock, refresh: Duration) {
    let mut ticker = interval(refresh);

    loop {
        ticker.tick().await;

        let view = store.view(clock.now_ms()).await;
        match serde_json::to_string(&view) {
            Ok(json) => debug!("Display view: {}", json),
            Err(e) => warn!("Failed to render display view: {}", e),
        }
    }
}
