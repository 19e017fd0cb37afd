//! # cxxlens Utilities
//!
//! Shared helpers for the cxxlens workspace, currently the `tracing` setup
//! used by the command line tool.

pub mod logging;

pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use tracing::{debug, error, info, trace, warn};
