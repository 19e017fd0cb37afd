//! # Formatter Registry
//!
//! Ordered mapping from type-name predicates to formatter functions.
//!
//! Lookup is a linear scan in registration order and the first matching
//! formatter wins. Order is part of the contract: the `char *` string
//! formatters are registered before the catch-all pointer formatter, and
//! `Sequence<PropertyValue>` before the generic `Sequence<…>`.
//!
//! ## Matchers
//!
//! - [`TypeMatcher::Exact`]: set membership over exact names, for the common
//!   primitives
//! - [`TypeMatcher::Patterns`]: regular expressions, tried against every name
//!   and then, only if none matched, against every name with a leading
//!   `const ` removed
//! - [`TypeMatcher::Predicate`]: any function of the layout (pointer-ness)

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use tracing::debug;

use crate::engine::FormatContext;
use crate::error::Result;
use crate::result::FormatterResult;
use crate::types::TypeInfo;
use crate::value::Value;

/// Signature shared by all formatters
///
/// An `Err` aborts this formatter only; the engine renders the value as empty.
pub type FormatFn = for<'e, 'a> fn(&FormatContext<'e>, Value<'a>) -> Result<FormatterResult<'a>>;

/// Decides whether a formatter applies to a type
pub enum TypeMatcher
{
    /// Any of the type's names is in the set
    Exact(HashSet<String>),
    /// Any of the patterns matches a name (or, failing that, a name minus `const `)
    Patterns(Vec<Regex>),
    /// Arbitrary test over the layout
    Predicate(fn(&TypeInfo) -> bool),
}

impl fmt::Debug for TypeMatcher
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            TypeMatcher::Exact(names) => {
                let mut names: Vec<_> = names.iter().collect();
                names.sort();
                f.debug_tuple("Exact").field(&names).finish()
            }
            TypeMatcher::Patterns(patterns) => {
                let patterns: Vec<_> = patterns.iter().map(Regex::as_str).collect();
                f.debug_tuple("Patterns").field(&patterns).finish()
            }
            TypeMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl TypeMatcher
{
    /// Match any of the given exact names.
    pub fn exact<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeMatcher::Exact(names.into_iter().map(Into::into).collect())
    }

    /// Match any of the given regular expressions.
    ///
    /// ## Errors
    ///
    /// - `InvalidPattern`: an expression does not compile
    pub fn patterns(exprs: &[&str]) -> Result<Self>
    {
        let compiled = exprs.iter().map(|expr| Regex::new(expr)).collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(TypeMatcher::Patterns(compiled))
    }

    /// Match with an arbitrary test.
    pub fn predicate(test: fn(&TypeInfo) -> bool) -> Self
    {
        TypeMatcher::Predicate(test)
    }

    /// Whether the matcher accepts `info`.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use cxxlens_core::types::TypeInfo;
    /// use cxxlens_core::TypeMatcher;
    ///
    /// let matcher = TypeMatcher::patterns(&[r"^std::vector<.+>$"]).unwrap();
    /// assert!(matcher.matches(&TypeInfo::scalar("const std::vector<int>", 12)));
    /// assert!(!matcher.matches(&TypeInfo::scalar("std::vector", 12)));
    /// ```
    pub fn matches(&self, info: &TypeInfo) -> bool
    {
        match self {
            TypeMatcher::Exact(names) => info.names.iter().any(|name| names.contains(name)),
            TypeMatcher::Patterns(patterns) => {
                let direct = patterns.iter().any(|pattern| info.names.iter().any(|name| pattern.is_match(name)));
                direct
                    || patterns.iter().any(|pattern| {
                        info.names
                            .iter()
                            .filter_map(|name| name.strip_prefix("const "))
                            .any(|name| pattern.is_match(name))
                    })
            }
            TypeMatcher::Predicate(test) => test(info),
        }
    }
}

/// A named (matcher, format function) registration
pub struct Formatter
{
    name: String,
    matcher: TypeMatcher,
    format: FormatFn,
}

impl fmt::Debug for Formatter
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Formatter")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl Formatter
{
    /// Create a registration.
    pub fn new(name: impl Into<String>, matcher: TypeMatcher, format: FormatFn) -> Self
    {
        Self {
            name: name.into(),
            matcher,
            format,
        }
    }

    /// Registration name (unique within a registry).
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// The matcher deciding which types this formatter handles.
    pub fn matcher(&self) -> &TypeMatcher
    {
        &self.matcher
    }

    /// The format function.
    pub fn format_fn(&self) -> FormatFn
    {
        self.format
    }
}

/// Ordered list of formatters, first match wins
#[derive(Debug, Default)]
pub struct FormatterRegistry
{
    formatters: Vec<Formatter>,
}

impl FormatterRegistry
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self
    {
        Self { formatters: Vec::new() }
    }

    /// Create a registry holding the built-in formatters.
    ///
    /// ## Errors
    ///
    /// - `InvalidPattern`: a built-in pattern failed to compile
    pub fn with_defaults() -> Result<Self>
    {
        let mut registry = Self::new();
        crate::formatters::register_defaults(&mut registry)?;
        Ok(registry)
    }

    /// Append a formatter with the lowest precedence so far.
    ///
    /// Registering a name that is already present leaves the registry
    /// unchanged and returns `false`.
    pub fn add_formatter(&mut self, formatter: Formatter) -> bool
    {
        if self.formatters.iter().any(|existing| existing.name == formatter.name) {
            debug!(name = %formatter.name, "formatter already registered");
            return false;
        }
        self.formatters.push(formatter);
        true
    }

    /// Shorthand for [`FormatterRegistry::add_formatter`].
    pub fn register(&mut self, name: &str, matcher: TypeMatcher, format: FormatFn) -> bool
    {
        self.add_formatter(Formatter::new(name, matcher, format))
    }

    /// The first formatter whose matcher accepts `info`.
    pub fn resolve(&self, info: &TypeInfo) -> Option<&Formatter>
    {
        self.formatters.iter().find(|formatter| formatter.matcher.matches(info))
    }

    /// Formatters in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = &Formatter>
    {
        self.formatters.iter()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize
    {
        self.formatters.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool
    {
        self.formatters.is_empty()
    }
}
