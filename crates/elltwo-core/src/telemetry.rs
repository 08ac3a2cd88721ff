//! Tracing setup shared by the elltwo binaries.
//!
//! ```ignore
//! use elltwo_core::telemetry::{self, TelemetryConfig};
//!
//! telemetry::init(TelemetryConfig::from_env("elltwo-server"));
//! tracing::info!("server started");
//! ```

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for the startup log line
    pub service_name: String,
    /// Console log level (default: INFO, DEBUG in debug builds)
    pub console_level: Level,
}

impl TelemetryConfig {
    /// `RUST_LOG` overrides `console_level` when set.
    pub fn from_env(service_name: impl Into<String>) -> Self {
        let console_level = if cfg!(debug_assertions) {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            service_name: service_name.into(),
            console_level,
        }
    }
}

/// Install a compact console layer on stderr. Call once at startup.
pub fn init(config: TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.console_level.as_str().to_lowercase()));

    // stderr keeps logs out of the terminal client's document view on stdout
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(console_layer).init();

    tracing::debug!(service = %config.service_name, "telemetry initialized");
}
