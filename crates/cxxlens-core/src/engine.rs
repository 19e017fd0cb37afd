//! # Formatter Engine
//!
//! One engine per debug session. It owns the formatter registry, the decoding
//! [`Limits`] and the UNO type cache, and is the only place formatter errors
//! are turned into degraded results.
//!
//! ## Session lifetime
//!
//! UNO type resolution is memoized by the address of the type description.
//! Addresses are only stable for one run of the debuggee, so the cache lives in
//! the engine rather than in a global, and [`FormatterEngine::reset_session`]
//! drops it when the debuggee restarts.
//!
//! ## Thread Safety
//!
//! The engine is **not** thread-safe (the cache sits in a `RefCell`). Formatting
//! is synchronous and runs to completion on the calling thread.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace_span};

use crate::config::Limits;
use crate::error::Result;
use crate::formatters::uno::{self, TypeEntry, UnoTypeCache};
use crate::memory::WasmInterface;
use crate::registry::{Formatter, FormatterRegistry};
use crate::result::FormatterResult;
use crate::value::Value;

/// What a formatter can reach besides the value itself
pub struct FormatContext<'e>
{
    wasm: &'e dyn WasmInterface,
    limits: Limits,
    uno_types: &'e RefCell<UnoTypeCache>,
}

impl<'e> FormatContext<'e>
{
    pub(crate) fn new(wasm: &'e dyn WasmInterface, limits: Limits, uno_types: &'e RefCell<UnoTypeCache>) -> Self
    {
        Self { wasm, limits, uno_types }
    }

    /// Raw access to the debuggee's memory.
    pub fn wasm(&self) -> &'e dyn WasmInterface
    {
        self.wasm
    }

    /// Decoding limits for this session.
    pub fn limits(&self) -> Limits
    {
        self.limits
    }

    pub(crate) fn uno_types(&self) -> &'e RefCell<UnoTypeCache>
    {
        self.uno_types
    }
}

/// Formats values for one debug session
///
/// ## Example
///
/// ```rust
/// use cxxlens_core::memory::LinearMemory;
/// use cxxlens_core::types::{Address, TypeInfo, TypeTable};
/// use cxxlens_core::{FormatterEngine, FormatterResult, Value};
///
/// let memory = LinearMemory::new(0x100);
/// let mut types = TypeTable::new();
/// types.insert(TypeInfo::scalar("int32_t", 4));
/// types.insert(TypeInfo::pointer("int32_t *", "int32_t"));
///
/// let engine = FormatterEngine::new().unwrap();
/// let null = Value::of_type(&memory, &types, Address::new(0x40), "int32_t *").unwrap();
/// let Some(FormatterResult::Map(map)) = engine.format(null) else { panic!() };
/// assert_eq!(map.get("0x0"), Some(&None));
/// ```
#[derive(Debug)]
pub struct FormatterEngine
{
    registry: FormatterRegistry,
    limits: Limits,
    uno_types: RefCell<UnoTypeCache>,
}

impl FormatterEngine
{
    /// Engine with the built-in formatters and default limits.
    ///
    /// ## Errors
    ///
    /// - `InvalidPattern`: a built-in pattern failed to compile
    pub fn new() -> Result<Self>
    {
        Self::with_limits(Limits::default())
    }

    /// Engine with the built-in formatters and custom limits.
    pub fn with_limits(limits: Limits) -> Result<Self>
    {
        Ok(Self::from_parts(FormatterRegistry::with_defaults()?, limits))
    }

    /// Engine over an existing registry.
    pub fn from_parts(registry: FormatterRegistry, limits: Limits) -> Self
    {
        Self {
            registry,
            limits,
            uno_types: RefCell::new(UnoTypeCache::default()),
        }
    }

    /// The registry, for inspection.
    pub fn registry(&self) -> &FormatterRegistry
    {
        &self.registry
    }

    /// The registry, for adding formatters.
    pub fn registry_mut(&mut self) -> &mut FormatterRegistry
    {
        &mut self.registry
    }

    /// Decoding limits.
    pub fn limits(&self) -> Limits
    {
        self.limits
    }

    /// The formatter that would handle `value`, if any.
    pub fn formatter_for(&self, value: &Value<'_>) -> Option<&Formatter>
    {
        self.registry.resolve(value.type_info())
    }

    /// Format a value.
    ///
    /// Returns `None` when no formatter matches, leaving the host to show the
    /// raw layout. A formatter that fails yields `Some(FormatterResult::Empty)`;
    /// errors never escape.
    pub fn format<'a>(&self, value: Value<'a>) -> Option<FormatterResult<'a>>
    {
        let formatter = self.formatter_for(&value)?;
        let _span = trace_span!("format", formatter = formatter.name(), location = %value.location()).entered();

        let context = FormatContext::new(value.memory(), self.limits, &self.uno_types);
        match (formatter.format_fn())(&context, value) {
            Ok(result) => Some(result),
            Err(err) => {
                debug!(formatter = formatter.name(), location = %value.location(), %err, "formatter failed, rendering as empty");
                Some(FormatterResult::Empty)
            }
        }
    }

    /// Resolve the UNO type described at `value`, using the session cache.
    ///
    /// Memory faults are logged and reported as unresolved.
    pub fn resolve_uno_type(&self, value: Value<'_>) -> Option<Rc<TypeEntry>>
    {
        let context = FormatContext::new(value.memory(), self.limits, &self.uno_types);
        match uno::resolve_uno_type(&context, value) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(location = %value.location(), %err, "UNO type resolution failed");
                None
            }
        }
    }

    /// Number of (resolved, unresolved) addresses in the UNO type cache.
    pub fn uno_cache_len(&self) -> (usize, usize)
    {
        let cache = self.uno_types.borrow();
        (cache.resolved_len(), cache.unresolved_len())
    }

    /// Forget everything memoized for the current debuggee.
    ///
    /// Call when the debuggee restarts; type descriptions from the previous
    /// run may have been freed and their addresses reused.
    pub fn reset_session(&self)
    {
        debug!("resetting formatter session caches");
        self.uno_types.borrow_mut().clear();
    }
}
