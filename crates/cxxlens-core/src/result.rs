//! # Formatter Results
//!
//! What a formatter hands back to the host. Results are either fully decoded
//! (numbers, text) or refer to further [`Value`]s the host can expand on
//! demand, which keeps formatting a large structure proportional to what the
//! user actually opens.

use std::fmt;

use crate::value::Value;

/// Ordered mapping from display label to child value
///
/// Labels are unique. Inserting an existing label replaces its value but keeps
/// its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildMap<'a>
{
    entries: Vec<(String, Option<Value<'a>>)>,
}

impl<'a> ChildMap<'a>
{
    /// Create an empty map.
    pub fn new() -> Self
    {
        Self { entries: Vec::new() }
    }

    /// A map with a single entry.
    pub fn single(label: impl Into<String>, value: Option<Value<'a>>) -> Self
    {
        Self {
            entries: vec![(label.into(), value)],
        }
    }

    /// Insert or replace `label`.
    pub fn insert(&mut self, label: impl Into<String>, value: Option<Value<'a>>)
    {
        let label = label.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    /// Look up `label`; the inner `None` is an explicit null child.
    pub fn get(&self, label: &str) -> Option<&Option<Value<'a>>>
    {
        self.entries.iter().find(|(existing, _)| existing == label).map(|(_, value)| value)
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str>
    {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Value<'a>>)>
    {
        self.entries.iter().map(|(label, value)| (label.as_str(), *value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }
}

/// Storage class of a wasm reference-typed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass
{
    /// A module global
    Global,
    /// A function local
    Local,
    /// An operand stack slot
    Operand,
}

impl ValueClass
{
    /// Decode the class index stored in the upper word of an externref handle.
    pub fn from_index(index: u32) -> Option<Self>
    {
        match index {
            0 => Some(ValueClass::Global),
            1 => Some(ValueClass::Local),
            2 => Some(ValueClass::Operand),
            _ => None,
        }
    }
}

impl fmt::Display for ValueClass
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            ValueClass::Global => "global",
            ValueClass::Local => "local",
            ValueClass::Operand => "operand",
        };
        f.write_str(name)
    }
}

/// Handle to an opaque `externref`, resolved by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternRef
{
    /// Where the reference lives; `None` if the encoding named no known class
    pub value_class: Option<ValueClass>,
    /// Slot index within that class
    pub index: u32,
}

impl fmt::Display for ExternRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.value_class {
            Some(class) => write!(f, "reftype({class}, {})", self.index),
            None => write!(f, "reftype(?, {})", self.index),
        }
    }
}

/// Output of a formatter
#[derive(Debug, Clone, PartialEq)]
pub enum FormatterResult<'a>
{
    /// A boolean
    Bool(bool),
    /// A signed integer up to 64 bits
    Int(i64),
    /// An unsigned integer up to 64 bits
    UInt(u64),
    /// A floating-point number
    Float(f64),
    /// A signed 128-bit integer
    Int128(i128),
    /// An unsigned 128-bit integer
    UInt128(u128),
    /// Decoded text
    Text(String),
    /// Decoded text together with the element count the object reported
    SizedText
    {
        /// Length in characters as stored in the object
        size: u32,
        /// Decoded contents
        text: String,
    },
    /// The `<void>` marker
    Void,
    /// An opaque reference the host resolves itself
    ExternRef(ExternRef),
    /// One value to be formatted in place of this one
    Child(Value<'a>),
    /// Labelled children (pointer boxes, property bags)
    Map(ChildMap<'a>),
    /// Indexed children (vectors, sequences)
    Array(Vec<Value<'a>>),
    /// Nothing to show
    Empty,
}

impl<'a> FormatterResult<'a>
{
    /// The `{ "0x<address>": target }` box used for pointers and references.
    pub fn pointer_box(address: u32, target: Option<Value<'a>>) -> Self
    {
        FormatterResult::Map(ChildMap::single(format!("0x{address:x}"), target))
    }

    /// Text content of `Text` and `SizedText`.
    pub fn as_text(&self) -> Option<&str>
    {
        match self {
            FormatterResult::Text(text) | FormatterResult::SizedText { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Whether this is [`FormatterResult::Empty`].
    pub fn is_empty(&self) -> bool
    {
        matches!(self, FormatterResult::Empty)
    }
}
