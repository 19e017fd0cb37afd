//! # Error Types
//!
//! Error handling for the formatter engine.
//!
//! We use `thiserror` to generate the `Error` implementations and messages.
//!
//! Errors never cross the formatter registry boundary: the engine logs them and
//! renders the value as empty. Inside a formatter they separate two situations
//! that look alike from the outside:
//!
//! - a field or pointer that is simply not there (navigation returns `None`)
//! - memory that cannot be read at all ([`LensError::MemoryFault`]), which aborts
//!   the current formatting attempt

use thiserror::Error;

use crate::types::Address;

/// Main error type for formatter operations
///
/// ## Error Categories
///
/// 1. **Memory errors**: MemoryFault
/// 2. **Layout errors**: MissingField, UnknownType
/// 3. **Registry errors**: InvalidPattern
/// 4. **Snapshot errors**: InvalidSnapshot, Json, Io
#[derive(Error, Debug)]
pub enum LensError
{
    /// A read touched bytes outside the debuggee's linear memory
    ///
    /// Fatal for the formatter that issued the read. The engine turns it into
    /// an empty result so sibling values still render.
    #[error("Memory fault reading {length} bytes at {address}")]
    MemoryFault
    {
        /// First byte of the failed read
        address: Address,
        /// Number of bytes requested
        length: u32,
    },

    /// A layout the formatter depends on lacks a field
    ///
    /// Raised when a value claims to be, say, a libc++ string but its type does
    /// not have the `__r_` member the layout requires.
    #[error("Missing field `{field}` on `{type_name}`")]
    MissingField
    {
        /// Dotted path of the missing field
        field: String,
        /// Primary name of the type that was searched
        type_name: String,
    },

    /// A type name was not present in the type table
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// A formatter was registered with a pattern that is not a valid regex
    #[error("Invalid type pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A memory snapshot was structurally invalid (bad hex, overlapping bounds)
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A memory snapshot was not valid JSON
    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (reading snapshot files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, LensError>`
///
/// ```rust
/// use cxxlens_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, LensError>;
