use std::path::PathBuf;

use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub struct LoggerConfig {
    whoami: String,
    default_directive: String,
    log_file: Option<PathBuf>,
}

impl LoggerConfig {
    pub fn with_base_name(whoami: &str) -> Self {
        Self {
            whoami: whoami.to_owned(),
            default_directive: "info".to_owned(),
            log_file: None,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn set_default_directive(&mut self, directive: &str) {
        self.default_directive = directive.to_owned();
    }

    pub fn set_log_file(&mut self, path: PathBuf) {
        self.log_file = Some(path);
    }
}

/// Initializes the logging subsystem with the provided config.
pub fn init(config: LoggerConfig) {
    let filt = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_directive));

    // Stdout logging.
    let stdout_sub = tracing_subscriber::fmt::layer().compact().with_filter(filt);

    // Optional file output, always unfiltered.
    if let Some(path) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("init: open log file");
        let file_sub = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Arc::new(file))
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(stdout_sub)
            .with(file_sub)
            .init();
    } else {
        tracing_subscriber::registry().with(stdout_sub).init();
    }

    info!(whoami = %config.whoami, "logging started");
}

/// Shuts down the logging subsystem, flushing files as needed.
pub fn finalize() {
    info!("shutting down logging");
}
