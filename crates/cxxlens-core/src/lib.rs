//! # cxxlens-core
//!
//! Value formatters for native code running inside a WebAssembly instance.
//!
//! A debugger that steps through C++ compiled to wasm32 only sees linear memory
//! and static type metadata. This crate turns that into something a person can
//! read:
//! - libc++ strings (short/long layouts) and raw null-terminated buffers
//! - LibreOffice RTL strings and UNO values (`Any`, `Reference`, `Sequence`)
//! - vectors, pointers and dynamic arrays as lazily expandable children
//! - fixed-width integers, floats, characters and 128-bit integers
//!
//! ## Architecture
//!
//! - [`memory`]: the [`WasmInterface`] trait hosts implement to expose memory
//! - [`types`]: addresses and the static type layouts values are read through
//! - [`value`]: typed reads and structural navigation over a memory location
//! - [`registry`]: ordered, first-match-wins mapping from type names to formatters
//! - [`formatters`]: the built-in formatters, UNO type resolution included
//! - [`engine`]: ties the above together for one debug session
//!
//! ## Example
//!
//! ```rust
//! use cxxlens_core::memory::LinearMemory;
//! use cxxlens_core::types::{Address, TypeInfo, TypeTable};
//! use cxxlens_core::{FormatterEngine, FormatterResult, Value};
//!
//! let mut memory = LinearMemory::new(0x100);
//! memory.write_u32(Address::new(0x10), 42).unwrap();
//!
//! let mut types = TypeTable::new();
//! types.insert(TypeInfo::scalar("uint32_t", 4));
//!
//! let engine = FormatterEngine::new().unwrap();
//! let value = Value::of_type(&memory, &types, Address::new(0x10), "uint32_t").unwrap();
//! assert!(matches!(engine.format(value), Some(FormatterResult::UInt(42))));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod formatters;
pub mod memory;
pub mod registry;
pub mod result;
pub mod snapshot;
pub mod types;
pub mod value;

pub use config::Limits;
pub use engine::{FormatContext, FormatterEngine};
pub use error::{LensError, Result};
pub use memory::WasmInterface;
pub use registry::{FormatFn, Formatter, FormatterRegistry, TypeMatcher};
pub use result::{ChildMap, ExternRef, FormatterResult, ValueClass};
pub use value::Value;
