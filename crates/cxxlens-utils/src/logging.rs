//! # Logging Utilities
//!
//! Logging for cxxlens using `tracing`.
//!
//! Rendered values go to stdout, so every log line is written to stderr and,
//! optionally, to a file. Formatter failures, capped containers and UNO type
//! graph walks all log through here.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cxxlens_utils::init_logging;
//!
//! // Keep the guard alive until the program exits
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("Formatter engine ready");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (e.g. `RUST_LOG=debug`, `RUST_LOG=cxxlens_core::formatters::uno=trace`)
//! - `CXXLENS_LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//! - `CXXLENS_LOG_FILE`: also write logs to this file; a directory gets a dated
//!   `YYYY-MM-DD-cxxlens.log` inside it

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" | "human" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the file writer flushing until dropped
///
/// Dropping the guard flushes any buffered file output. Hold it for the
/// lifetime of the program.
#[derive(Debug, Default)]
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    file: Option<WorkerGuard>,
    path: Option<PathBuf>,
}

impl LoggingGuard
{
    /// The file logs are written to, if any.
    pub fn log_file(&self) -> Option<&Path>
    {
        self.path.as_deref()
    }

    /// Whether a file writer is attached.
    pub fn has_file(&self) -> bool
    {
        self.file.is_some()
    }
}

/// Initialize logging from the environment
///
/// Reads `RUST_LOG`, `CXXLENS_LOG_FORMAT` and `CXXLENS_LOG_FILE`. Warnings
/// and errors are shown when `RUST_LOG` is unset.
///
/// ## Errors
///
/// - `InvalidFormat`: `CXXLENS_LOG_FORMAT` is set to something unknown
/// - `InitializationFailed`: a global subscriber is already installed
/// - `FileError`: the log directory could not be created
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    let format = match env::var("CXXLENS_LOG_FORMAT") {
        Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat)?,
        Err(_) => LogFormat::Pretty,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()));
    init_logging_internal(format, filter)
}

/// Initialize logging with an explicit level, ignoring `RUST_LOG`
///
/// ## Example
///
/// ```rust,no_run
/// use cxxlens_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty).expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the log directory
/// could not be created.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_internal(format, EnvFilter::new(Level::from(level).to_string()))
}

/// Where `CXXLENS_LOG_FILE` asks logs to go.
///
/// A path that names an existing directory, or ends in a separator, gets a
/// dated file name appended.
pub fn resolve_log_file(requested: &Path) -> PathBuf
{
    let as_text = requested.to_string_lossy();
    if requested.is_dir() || as_text.ends_with('/') || as_text.ends_with(std::path::MAIN_SEPARATOR) {
        let today = Utc::now().format("%Y-%m-%d");
        requested.join(format!("{today}-cxxlens.log"))
    } else {
        requested.to_path_buf()
    }
}

fn console_layer(format: LogFormat, filter: EnvFilter) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(true).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

fn file_layer(format: LogFormat, filter: EnvFilter, path: &Path) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(directory)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InitializationFailed(format!("{} is not a file path", path.display())))?;

    // The file name already carries a date when one was requested
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false);

    let layer = match format {
        LogFormat::Pretty => layer.with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    };
    Ok((layer, guard))
}

fn init_logging_internal(format: LogFormat, filter: EnvFilter) -> Result<LoggingGuard, LoggingError>
{
    let mut layers = vec![console_layer(format, filter.clone())];
    let mut guard = LoggingGuard::default();

    if let Some(requested) = env::var_os("CXXLENS_LOG_FILE").map(PathBuf::from) {
        let path = resolve_log_file(&requested);
        let (layer, file_guard) = file_layer(format, filter, &path)?;
        layers.push(layer);
        guard.file = Some(file_guard);
        guard.path = Some(path);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

    Ok(guard)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("text").unwrap(), LogFormat::Pretty);
        assert!(LogFormat::from_str("yaml").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("verbose").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_resolve_log_file()
    {
        let file = Path::new("/var/log/cxxlens/run.log");
        assert_eq!(resolve_log_file(file), file.to_path_buf());

        let dated = resolve_log_file(&env::temp_dir());
        let name = dated.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-cxxlens.log"));
        assert_eq!(name.len(), "YYYY-MM-DD-cxxlens.log".len());
    }

    #[test]
    fn test_default_guard_has_no_file()
    {
        let guard = LoggingGuard::default();
        assert!(!guard.has_file());
        assert_eq!(guard.log_file(), None);
    }
}
