//! # Type Layouts
//!
//! Static type metadata supplied by the debugger host.
//!
//! The engine never parses debug info itself. The host describes every type it
//! may hand to a formatter: the names it goes by, its size, and what it is
//! (scalar, pointer, array or struct). Members and pointees refer to other
//! types by name, so self-referential graphs such as typelib descriptions
//! need no forward declarations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Names a type is known by, most specific first
pub type TypeNames = SmallVec<[String; 2]>;

/// One member of a struct layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member
{
    /// Field name as it appears in debug info (may be `<union>` for anonymous unions)
    pub name: String,
    /// Name of the member's type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Byte offset from the start of the enclosing struct
    pub offset: u32,
}

impl Member
{
    /// Create a member description.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, offset: u32) -> Self
    {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            offset,
        }
    }
}

/// Structural kind of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind
{
    /// Integers, floats, characters, enums: anything read as raw bytes
    Scalar,
    /// A 32-bit pointer into linear memory
    Pointer
    {
        /// Name of the pointed-to type
        pointee: String,
    },
    /// A C array, `count` is `None` for `T[]`
    Array
    {
        /// Name of the element type
        element: String,
        /// Declared element count
        #[serde(default)]
        count: Option<u32>,
    },
    /// A struct, class or union
    Struct
    {
        /// Members in declaration order
        members: Vec<Member>,
    },
}

/// Layout of one type
///
/// ## Example
///
/// ```rust
/// use cxxlens_core::types::{Member, TypeInfo};
///
/// let pair = TypeInfo::structure("pair", 8, vec![Member::new("first", "int32_t", 0), Member::new("second", "int32_t", 4)])
///     .with_alias("const pair");
/// assert_eq!(pair.primary_name(), "pair");
/// assert!(pair.member("second").is_some());
/// assert!(!pair.is_pointer());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo
{
    /// Every spelling of this type, most specific first
    pub names: TypeNames,
    /// Size in bytes
    pub size: u32,
    /// What the type is
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeInfo
{
    /// A scalar type read as raw bytes.
    pub fn scalar(name: impl Into<String>, size: u32) -> Self
    {
        Self {
            names: smallvec![name.into()],
            size,
            kind: TypeKind::Scalar,
        }
    }

    /// A wasm32 pointer to `pointee`.
    pub fn pointer(name: impl Into<String>, pointee: impl Into<String>) -> Self
    {
        Self {
            names: smallvec![name.into()],
            size: 4,
            kind: TypeKind::Pointer { pointee: pointee.into() },
        }
    }

    /// An array of `element`; pass `None` as `count` for `T[]`.
    pub fn array(name: impl Into<String>, element: impl Into<String>, count: Option<u32>, size: u32) -> Self
    {
        Self {
            names: smallvec![name.into()],
            size,
            kind: TypeKind::Array {
                element: element.into(),
                count,
            },
        }
    }

    /// A struct with the given members.
    pub fn structure(name: impl Into<String>, size: u32, members: Vec<Member>) -> Self
    {
        Self {
            names: smallvec![name.into()],
            size,
            kind: TypeKind::Struct { members },
        }
    }

    /// Add another spelling of this type (typedef, `const` variant, template expansion).
    #[must_use]
    pub fn with_alias(mut self, name: impl Into<String>) -> Self
    {
        self.names.push(name.into());
        self
    }

    /// The most specific name.
    pub fn primary_name(&self) -> &str
    {
        self.names.first().map_or("", String::as_str)
    }

    /// Whether any of the names equals `name`.
    pub fn has_name(&self, name: &str) -> bool
    {
        self.names.iter().any(|candidate| candidate == name)
    }

    /// Whether this is a pointer type.
    pub fn is_pointer(&self) -> bool
    {
        matches!(self.kind, TypeKind::Pointer { .. })
    }

    /// Members of a struct, empty for every other kind.
    pub fn members(&self) -> &[Member]
    {
        match &self.kind {
            TypeKind::Struct { members } => members,
            _ => &[],
        }
    }

    /// Look up a struct member by name.
    pub fn member(&self, name: &str) -> Option<&Member>
    {
        self.members().iter().find(|member| member.name == name)
    }
}

/// Name-indexed collection of type layouts
///
/// Every name of every inserted type resolves to that type. Inserting a type
/// whose name is already taken rebinds the name to the newer layout.
///
/// A fresh table already knows `void`, so `void *` values can be dereferenced
/// and reinterpreted without the host describing it.
#[derive(Debug, Clone)]
pub struct TypeTable
{
    types: Vec<TypeInfo>,
    by_name: HashMap<String, usize>,
}

impl Default for TypeTable
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl TypeTable
{
    /// Create a table containing only `void`.
    #[must_use]
    pub fn new() -> Self
    {
        let mut table = Self {
            types: Vec::new(),
            by_name: HashMap::new(),
        };
        table.insert(TypeInfo::scalar("void", 0));
        table
    }

    /// Insert a layout, binding all of its names.
    pub fn insert(&mut self, info: TypeInfo)
    {
        let index = self.types.len();
        for name in &info.names {
            self.by_name.insert(name.clone(), index);
        }
        self.types.push(info);
    }

    /// Find the layout a name is bound to.
    pub fn lookup(&self, name: &str) -> Option<&TypeInfo>
    {
        self.by_name.get(name).map(|&index| &self.types[index])
    }

    /// Number of layouts, `void` included.
    pub fn len(&self) -> usize
    {
        self.types.len()
    }

    /// Whether the table holds nothing beyond what [`TypeTable::new`] seeds.
    pub fn is_empty(&self) -> bool
    {
        self.types.len() <= 1
    }

    /// Iterate over layouts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo>
    {
        self.types.iter()
    }
}

impl Extend<TypeInfo> for TypeTable
{
    fn extend<I: IntoIterator<Item = TypeInfo>>(&mut self, iter: I)
    {
        for info in iter {
            self.insert(info);
        }
    }
}

impl FromIterator<TypeInfo> for TypeTable
{
    fn from_iter<I: IntoIterator<Item = TypeInfo>>(iter: I) -> Self
    {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}
