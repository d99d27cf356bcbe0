//! Centralized logging configuration for the preview gallery
//!
//! Wraps `tracing` and `tracing-subscriber` so the CLI, embedded hosts and
//! tests all format logs the same way.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gallery_logging::{init, LogConfig, LogOutput};
//!
//! // CLI with debug flag
//! init(LogConfig::cli(true));
//!
//! // App process embedding the tooling client: keep stdout clean
//! init(LogConfig::new().output(LogOutput::Stderr));
//!
//! // File logging with daily rotation; hold the guard until exit
//! let _guard = init_with_file(LogConfig::serve(false), Path::new("logs/gallery.log"))?;
//! ```

use std::io::IsTerminal;
use std::path::Path;
use tracing_subscriber::fmt::time::{LocalTime, UtcTime};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing::{debug, error, info, instrument, trace, warn, Level};

pub use tracing_appender::non_blocking::WorkerGuard;

/// Error returned when a global subscriber is already installed
pub type TryInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Output destination for logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Requires `init_with_file`; plain `init` falls back to stderr
    File,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampFormat {
    #[default]
    Local,
    Utc,
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Enable debug-level logging (overrides default_level and RUST_LOG)
    pub debug: bool,
    /// Default log level when RUST_LOG is not set
    pub default_level: String,
    pub output: LogOutput,
    /// Show module target in log output
    pub show_target: bool,
    pub timestamp_format: TimestampFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            debug: false,
            default_level: "info".to_string(),
            output: LogOutput::Stdout,
            show_target: false,
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    pub fn default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn utc(self) -> Self {
        self.timestamp_format(TimestampFormat::Utc)
    }

    /// Preset for one-shot CLI commands
    pub fn cli(debug: bool) -> Self {
        Self::new().debug(debug)
    }

    /// Preset for `gallery serve` (targets shown, module-level filtering is useful)
    pub fn serve(debug: bool) -> Self {
        Self::new().debug(debug).show_target(true)
    }

    /// Preset for app processes hosting the tooling client
    pub fn app(debug: bool) -> Self {
        Self::new().debug(debug).output(LogOutput::Stderr)
    }

    fn build_filter(&self) -> EnvFilter {
        if self.debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.default_level))
        }
    }
}

// Applies the timer and finishes the builder; the branches have different
// builder types so this can't be a plain function.
macro_rules! finish_with_timer {
    ($builder:expr, $ts_format:expr, $finish:ident) => {
        match $ts_format {
            TimestampFormat::Utc => $builder.with_timer(UtcTime::rfc_3339()).$finish(),
            TimestampFormat::Local => $builder.with_timer(LocalTime::rfc_3339()).$finish(),
        }
    };
}

macro_rules! console_subscriber {
    ($config:expr, $finish:ident) => {{
        let config = $config;
        let filter = config.build_filter();
        match config.output {
            LogOutput::Stdout => {
                let builder = fmt()
                    .with_env_filter(filter)
                    .with_target(config.show_target)
                    .with_ansi(std::io::stdout().is_terminal());
                finish_with_timer!(builder, config.timestamp_format, $finish)
            }
            LogOutput::Stderr | LogOutput::File => {
                let builder = fmt()
                    .with_env_filter(filter)
                    .with_target(config.show_target)
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal());
                finish_with_timer!(builder, config.timestamp_format, $finish)
            }
        }
    }};
}

/// Initialize the logging system
///
/// # Environment Variables
///
/// - `RUST_LOG`: Override log level (e.g., `RUST_LOG=gallery_server=trace`)
///
/// # Panics
///
/// Panics if a global subscriber is already installed; use [`try_init`] when
/// that can happen (embedded hosts, tests).
pub fn init(config: LogConfig) {
    console_subscriber!(config, init)
}

/// Initialize the logging system, failing instead of panicking if a global
/// subscriber already exists
pub fn try_init(config: LogConfig) -> Result<(), TryInitError> {
    console_subscriber!(config, try_init)
}

/// Initialize the logging system with daily-rolling file output
///
/// The returned `WorkerGuard` must be held for the duration of the program
/// so buffered lines are flushed on shutdown.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created.
pub fn init_with_file(config: LogConfig, log_path: &Path) -> std::io::Result<WorkerGuard> {
    let filter = config.build_filter();

    let log_dir = match log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(log_dir)
        .map_err(|e| std::io::Error::other(format!("Failed to create log directory: {}", e)))?;

    let log_filename = log_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("gallery.log");

    // Files named {filename}.YYYY-MM-DD
    let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(config.show_target)
        .with_writer(non_blocking)
        .with_ansi(false);
    finish_with_timer!(builder, config.timestamp_format, init);

    Ok(guard)
}

/// Initialize logging for tests
///
/// Uses the test writer so output is captured per test. Safe to call
/// multiple times.
pub fn init_test() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}
