//! # UNO Formatters
//!
//! Formatting for the UNO component model: `Any`, `Reference<T>`,
//! `Sequence<T>`, `Type`, and the type-description resolver they share.
//!
//! ## Type resolution
//!
//! An `Any` only records its type as a pointer into the runtime type library.
//! [`resolve_uno_type`] walks that graph
//!
//! ```text
//! css::uno::Type ──_pType──▶ TypeDescriptionReference ──pType──▶ *TypeDescription
//!                                                                     │ aBase
//!                                                                     ▼
//!                                                              TypeDescription
//!                                                          (eTypeClass, pTypeName)
//! ```
//!
//! and turns it into a [`TypeEntry`] naming the C++ type the payload can be
//! read as. Every walk ends in one of two terminal states, memoized per
//! description address for the rest of the session:
//!
//! - **resolved**: the [`TypeEntry`] is cached and shared
//! - **unresolved**: the address is remembered and never walked again
//!
//! Every address is marked unresolved before its walk starts, so a graph
//! that leads back to a node still being resolved terminates. A successful
//! resolution replaces that provisional mark; a memory fault removes it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use once_cell::sync::Lazy;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::engine::FormatContext;
use crate::error::Result;
use crate::formatters::strings::{self, CharWidth};
use crate::result::{ChildMap, FormatterResult};
use crate::types::Address;
use crate::value::Value;

const CSSU_TYPE: &str = "com::sun::star::uno::Type";
const CSSU_ANY: &str = "com::sun::star::uno::Any";
const TYPE_DESC: &str = "_typelib_TypeDescription";
const TYPE_DESC_REF: &str = "_typelib_TypeDescriptionReference";
const INDIRECT_TYPE_DESC: &str = "_typelib_IndirectTypeDescription";
const PROPERTY_VALUE: &str = "com::sun::star::beans::PropertyValue";
const OUSTRING: &str = "rtl::OUString";

static TYPE_DESCS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        TYPE_DESC,
        "_typelib_CompoundTypeDescription",
        "_typelib_StructTypeDescription",
        INDIRECT_TYPE_DESC,
        "_typelib_EnumTypeDescription",
        "_typelib_InterfaceMemberTypeDescription",
        "_typelib_InterfaceMethodTypeDescription",
        "_typelib_InterfaceAttributeTypeDescription",
        "_typelib_InterfaceTypeDescription",
    ]
    .into_iter()
    .collect()
});

/// `typelib_TypeClass`, with the ordinals the runtime stores in `eTypeClass`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass
{
    /// `void`
    Void = 0,
    /// `sal_Unicode`, a UTF-16 code unit
    Char = 1,
    /// `sal_Bool`
    Boolean = 2,
    /// `sal_Int8`
    Byte = 3,
    /// `sal_Int16`
    Short = 4,
    /// `sal_uInt16`
    UnsignedShort = 5,
    /// `sal_Int32`
    Long = 6,
    /// `sal_uInt32`
    UnsignedLong = 7,
    /// `sal_Int64`
    Hyper = 8,
    /// `sal_uInt64`
    UnsignedHyper = 9,
    /// `float`
    Float = 10,
    /// `double`
    Double = 11,
    /// `rtl::OUString`
    String = 12,
    /// `css::uno::Type`
    Type = 13,
    /// `css::uno::Any`
    Any = 14,
    /// An IDL enum
    Enum = 15,
    /// An IDL typedef
    Typedef = 16,
    /// An IDL struct
    Struct = 17,
    /// An IDL exception
    Exception = 19,
    /// `css::uno::Sequence<T>`
    Sequence = 20,
    /// An interface, held through `Reference<T>`
    Interface = 22,
    /// A service
    Service = 23,
    /// A module
    Module = 24,
    /// An interface method
    InterfaceMethod = 25,
    /// An interface attribute
    InterfaceAttribute = 26,
    /// Unknown to the type library
    Unknown = 27,
    /// A property
    Property = 28,
    /// A constant
    Constant = 29,
    /// A constants group
    Constants = 30,
    /// A singleton
    Singleton = 31,
}

impl TypeClass
{
    /// Decode a stored ordinal; gaps in the numbering yield `None`.
    pub fn from_ordinal(ordinal: u32) -> Option<Self>
    {
        use TypeClass::*;

        Some(match ordinal {
            0 => Void,
            1 => Char,
            2 => Boolean,
            3 => Byte,
            4 => Short,
            5 => UnsignedShort,
            6 => Long,
            7 => UnsignedLong,
            8 => Hyper,
            9 => UnsignedHyper,
            10 => Float,
            11 => Double,
            12 => String,
            13 => Type,
            14 => Any,
            15 => Enum,
            16 => Typedef,
            17 => Struct,
            19 => Exception,
            20 => Sequence,
            22 => Interface,
            23 => Service,
            24 => Module,
            25 => InterfaceMethod,
            26 => InterfaceAttribute,
            27 => Unknown,
            28 => Property,
            29 => Constant,
            30 => Constants,
            31 => Singleton,
            _ => return None,
        })
    }

    /// Classes an `Any` decodes straight from its payload.
    fn has_direct_view(self) -> bool
    {
        matches!(
            self,
            TypeClass::Char
                | TypeClass::Boolean
                | TypeClass::Byte
                | TypeClass::Short
                | TypeClass::UnsignedShort
                | TypeClass::Long
                | TypeClass::UnsignedLong
                | TypeClass::Hyper
                | TypeClass::UnsignedHyper
                | TypeClass::Float
                | TypeClass::Double
                | TypeClass::String
        )
    }
}

/// A resolved UNO type and the C++ type its values are laid out as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry
{
    /// Class stored in the description's `eTypeClass`
    pub type_class: TypeClass,
    /// Dotted UNO name, e.g. `com.sun.star.beans.PropertyValue`
    pub uno_type: String,
    /// C++ spelling, e.g. `com::sun::star::beans::PropertyValue`
    pub cpp_type: String,
    /// Element type, for sequences
    pub element_type: Option<Rc<TypeEntry>>,
}

impl TypeEntry
{
    fn new(type_class: TypeClass, uno_type: String, cpp_type: String) -> Self
    {
        Self {
            type_class,
            uno_type,
            cpp_type,
            element_type: None,
        }
    }
}

impl fmt::Display for TypeEntry
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} ({:?})", self.cpp_type, self.type_class)
    }
}

/// Per-session memo of type-description addresses
///
/// An address is in at most one of the two sets.
#[derive(Debug, Default)]
pub struct UnoTypeCache
{
    resolved: HashMap<Address, Rc<TypeEntry>>,
    unresolved: HashSet<Address>,
}

impl UnoTypeCache
{
    /// Whether `address` is known not to resolve, or is being resolved.
    pub fn is_unresolved(&self, address: Address) -> bool
    {
        self.unresolved.contains(&address)
    }

    /// The cached entry for `address`.
    pub fn get(&self, address: Address) -> Option<Rc<TypeEntry>>
    {
        self.resolved.get(&address).cloned()
    }

    /// Remember `address` as unresolved, dropping any cached entry.
    pub fn mark_unresolved(&mut self, address: Address)
    {
        self.resolved.remove(&address);
        self.unresolved.insert(address);
    }

    /// Cache `entry` for `address`, replacing a provisional unresolved mark.
    pub fn insert_resolved(&mut self, address: Address, entry: Rc<TypeEntry>)
    {
        self.unresolved.remove(&address);
        self.resolved.insert(address, entry);
    }

    /// Drop whatever is known about `address`.
    pub fn forget(&mut self, address: Address)
    {
        self.resolved.remove(&address);
        self.unresolved.remove(&address);
    }

    /// Drop everything.
    pub fn clear(&mut self)
    {
        self.resolved.clear();
        self.unresolved.clear();
    }

    /// Number of resolved addresses.
    pub fn resolved_len(&self) -> usize
    {
        self.resolved.len()
    }

    /// Number of unresolved addresses.
    pub fn unresolved_len(&self) -> usize
    {
        self.unresolved.len()
    }
}

/// Resolve the UNO type described at `value`.
///
/// `value` may be a `css::uno::Type`, a `_typelib_TypeDescriptionReference`
/// or any of the `_typelib_*TypeDescription` records. Cached outcomes are
/// returned without reading memory.
///
/// ## Errors
///
/// - `MemoryFault`: part of the graph could not be read; nothing is cached
///   for `value`
pub fn resolve_uno_type(ctx: &FormatContext<'_>, value: Value<'_>) -> Result<Option<Rc<TypeEntry>>>
{
    let address = value.location();
    {
        let cache = ctx.uno_types().borrow();
        if cache.is_unresolved(address) {
            trace!(%address, "UNO type known unresolved");
            return Ok(None);
        }
        if let Some(entry) = cache.get(address) {
            trace!(%address, "UNO type cache hit");
            return Ok(Some(entry));
        }
    }

    ctx.uno_types().borrow_mut().mark_unresolved(address);
    let walked = match walk_type_graph(ctx, value) {
        Ok(walked) => walked,
        Err(err) => {
            ctx.uno_types().borrow_mut().forget(address);
            return Err(err);
        }
    };

    match walked {
        Some(entry) => {
            debug!(%address, %entry, "resolved UNO type");
            let entry = Rc::new(entry);
            ctx.uno_types().borrow_mut().insert_resolved(address, Rc::clone(&entry));
            Ok(Some(entry))
        }
        None => {
            debug!(%address, types = ?value.type_names(), "UNO type unresolved");
            Ok(None)
        }
    }
}

fn walk_type_graph(ctx: &FormatContext<'_>, value: Value<'_>) -> Result<Option<TypeEntry>>
{
    let mut current = value;

    if current.type_info().has_name(CSSU_TYPE) {
        let Some(inner) = current.child("_pType.*")? else {
            return Ok(None);
        };
        current = inner;
    }

    let mut visited: SmallVec<[Address; 4]> = SmallVec::new();
    while current.type_info().has_name(TYPE_DESC_REF) {
        if visited.contains(&current.location()) {
            debug!(address = %current.location(), "cycle in type description references");
            return Ok(None);
        }
        visited.push(current.location());
        let Some(inner) = current.child("pType.*")? else {
            return Ok(None);
        };
        current = inner;
    }

    if !current.type_names().iter().any(|name| TYPE_DESCS.contains(name.as_str())) {
        return Ok(None);
    }

    let full = current;
    let mut base = current;
    if !base.type_info().has_name(TYPE_DESC) {
        let mut seen: SmallVec<[&str; 4]> = SmallVec::new();
        while let Some(next) = base.field("aBase") {
            if seen.contains(&next.type_info().primary_name()) {
                break;
            }
            seen.push(next.type_info().primary_name());
            base = next;
        }
    }

    let ordinal = base.require("eTypeClass")?.as_u32()?;
    let Some(name_record) = base.child("pTypeName.*")? else {
        return Ok(None);
    };
    let name = strings::rtl_text(ctx, name_record, CharWidth::Utf16)?;

    let Some(type_class) = TypeClass::from_ordinal(ordinal) else {
        debug!(ordinal, %name, "unknown UNO type class");
        return Ok(None);
    };

    let entry = match type_class {
        TypeClass::Type => TypeEntry::new(type_class, name, CSSU_TYPE.to_string()),
        TypeClass::Any => TypeEntry::new(type_class, name, CSSU_ANY.to_string()),
        TypeClass::Enum | TypeClass::Struct | TypeClass::Exception | TypeClass::Interface => {
            let cpp_type = uno_to_cpp(&name);
            TypeEntry::new(type_class, name, cpp_type)
        }
        TypeClass::InterfaceAttribute | TypeClass::InterfaceMethod => {
            let Some(cpp_type) = member_pointer_name(&name) else {
                return Ok(None);
            };
            TypeEntry::new(type_class, name, cpp_type)
        }
        TypeClass::Sequence => {
            let Some(element) = sequence_element_type(full)? else {
                return Ok(None);
            };
            let Some(element) = resolve_uno_type(ctx, element)? else {
                return Ok(None);
            };
            TypeEntry {
                type_class,
                uno_type: name,
                cpp_type: format!("com::sun::star::uno::Sequence<{}>", element.cpp_type),
                element_type: Some(element),
            }
        }
        _ => {
            debug!(?type_class, %name, "UNO type class has no C++ mapping");
            return Ok(None);
        }
    };
    Ok(Some(entry))
}

/// `com.sun.star.uno.XInterface` → `com::sun::star::uno::XInterface`
pub fn uno_to_cpp(uno: &str) -> String
{
    uno.replace('.', "::")
}

/// Pointer-to-member spelling for an interface member name.
///
/// ```rust
/// use cxxlens_core::formatters::uno::member_pointer_name;
///
/// assert_eq!(
///     member_pointer_name("com.sun.star.frame.XModel::getURL").as_deref(),
///     Some("com::sun::star::frame::XModel::*getURL"),
/// );
/// assert_eq!(member_pointer_name("getURL"), None);
/// ```
pub fn member_pointer_name(name: &str) -> Option<String>
{
    let (interface, member) = name.split_once("::")?;
    let member = member.rsplit("::").next().unwrap_or(member);
    Some(format!("{}::*{member}", uno_to_cpp(interface)))
}

/// The element type of a sequence description, read through the indirect
/// layout even when the record is typed as a plain description.
fn sequence_element_type(description: Value<'_>) -> Result<Option<Value<'_>>>
{
    let indirect = if description.has_member("pType") {
        Some(description)
    } else {
        description.cast_to(INDIRECT_TYPE_DESC)
    };
    match indirect {
        Some(indirect) => indirect.child("pType.*"),
        None => Ok(None),
    }
}

/// Text between the outermost angle brackets of a template name.
///
/// ```rust
/// use cxxlens_core::formatters::uno::template_parameter;
///
/// assert_eq!(
///     template_parameter("com::sun::star::uno::Sequence<com::sun::star::uno::Sequence<sal_Int8> >"),
///     Some("com::sun::star::uno::Sequence<sal_Int8>"),
/// );
/// assert_eq!(template_parameter("rtl::OUString"), None);
/// ```
pub fn template_parameter(type_name: &str) -> Option<&str>
{
    let start = type_name.find('<')?;
    let end = type_name.rfind('>')?;
    (start < end).then(|| type_name[start + 1..end].trim())
}

/*
 * Any
 */

/// `uno_Any` / `css::uno::Any`.
///
/// Primitive payloads are decoded directly; everything else is resolved and
/// handed back as a child of the resolved C++ type. Any failure is logged and
/// shown as empty.
pub fn format_uno_any<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    match format_any_payload(ctx, value) {
        Ok(result) => Ok(result),
        Err(err) => {
            error!(location = %value.location(), %err, "failed to format UNO Any");
            Ok(FormatterResult::Empty)
        }
    }
}

fn format_any_payload<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let Some(description) = value.child("pType.*")? else {
        return Ok(FormatterResult::Empty);
    };

    let ordinal = description.require("eTypeClass")?.as_u32()?;
    match TypeClass::from_ordinal(ordinal) {
        Some(TypeClass::Void) => return Ok(FormatterResult::Empty),
        Some(type_class) if type_class.has_direct_view() => {
            let Some(data) = value.child("pData.*")? else {
                return Ok(FormatterResult::Empty);
            };
            return primitive_view(type_class, data);
        }
        _ => {}
    }

    let Some(entry) = resolve_uno_type(ctx, description)? else {
        return Ok(FormatterResult::Empty);
    };
    let Some(data) = value.field("pData") else {
        return Ok(FormatterResult::Empty);
    };
    Ok(data
        .cast_child_at_index_to(0, &entry.cpp_type)?
        .map_or(FormatterResult::Empty, FormatterResult::Child))
}

fn primitive_view<'a>(type_class: TypeClass, data: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(match type_class {
        TypeClass::Char => {
            let unit = data.as_u16()?;
            let text = char::from_u32(unit.into()).map_or_else(|| format!("U+{unit:04x}"), String::from);
            FormatterResult::Text(text)
        }
        TypeClass::Boolean => FormatterResult::Bool(data.as_u8()? != 0),
        TypeClass::Byte => FormatterResult::Text(char::from(data.as_u8()?).to_string()),
        TypeClass::Short => FormatterResult::Int(data.as_i16()?.into()),
        TypeClass::UnsignedShort => FormatterResult::UInt(data.as_u16()?.into()),
        TypeClass::Long => FormatterResult::Int(data.as_i32()?.into()),
        TypeClass::UnsignedLong => FormatterResult::UInt(data.as_u32()?.into()),
        TypeClass::Hyper => FormatterResult::Int(data.as_i64()?),
        TypeClass::UnsignedHyper => FormatterResult::UInt(data.as_u64()?),
        TypeClass::Float => FormatterResult::Float(data.as_f32()?.into()),
        TypeClass::Double => FormatterResult::Float(data.as_f64()?),
        TypeClass::String => data
            .cast_to(OUSTRING)
            .and_then(|string| string.field("pData"))
            .map_or(FormatterResult::Empty, FormatterResult::Child),
        _ => FormatterResult::Empty,
    })
}

/*
 * Reference, Sequence, Type
 */

/// `Reference<T>` as the interface it holds, viewed as `T`.
pub fn format_uno_reference<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let Some(interface) = value.child("_pInterface.*")? else {
        return Ok(FormatterResult::Empty);
    };
    let target = value.type_names().first().and_then(|name| template_parameter(name));
    Ok(target
        .and_then(|target| interface.cast_to(target))
        .map_or(FormatterResult::Empty, FormatterResult::Child))
}

/// The `_sal_Sequence` behind a `Sequence<T>`, with its element count.
fn sequence_storage<'a>(value: &Value<'a>) -> Result<Option<(Value<'a>, u32)>>
{
    let Some(storage) = value.child("_pSequence.*")? else {
        return Ok(None);
    };
    let count = u32::try_from(storage.require("nElements")?.as_i32()?).unwrap_or(0);
    Ok(storage.field("elements").map(|elements| (elements, count)))
}

fn capped_count(ctx: &FormatContext<'_>, value: &Value<'_>, count: u32) -> u32
{
    let limit = ctx.limits().max_elements;
    if count > limit {
        warn!(location = %value.location(), count, limit, "sequence truncated");
    }
    count.min(limit)
}

/// `Sequence<T>` as its elements, each viewed as `T`.
pub fn format_uno_sequence<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let Some((elements, count)) = sequence_storage(&value)? else {
        return Ok(FormatterResult::Array(Vec::new()));
    };
    let element_type = value.type_names().first().and_then(|name| template_parameter(name));

    let count = capped_count(ctx, &value, count);
    let mut result = Vec::with_capacity(count as usize);
    for index in 0..count {
        let element = match element_type {
            Some(element_type) => elements.cast_child_at_index_to(index, element_type)?,
            None => None,
        };
        let element = match element {
            Some(element) => Some(element),
            None => elements.element(index)?,
        };
        result.extend(element);
    }
    Ok(FormatterResult::Array(result))
}

/// `Sequence<PropertyValue>` as a map from property name to value.
pub fn format_uno_sequence_property_value<'a>(
    ctx: &FormatContext<'_>,
    value: Value<'a>,
) -> Result<FormatterResult<'a>>
{
    let Some((elements, count)) = sequence_storage(&value)? else {
        return Ok(FormatterResult::Map(ChildMap::new()));
    };

    let count = capped_count(ctx, &value, count);
    let mut properties = ChildMap::new();
    for index in 0..count {
        let Some(element) = elements.cast_child_at_index_to(index, PROPERTY_VALUE)? else {
            debug!(index, "PropertyValue layout unavailable");
            continue;
        };
        let Some(name_record) = element.child("Name.pData.*")? else {
            debug!(index, location = %element.location(), "PropertyValue without a name");
            continue;
        };
        let name = strings::rtl_text(ctx, name_record, CharWidth::Utf16)?;
        properties.insert(name, element.field("Value"));
    }
    Ok(FormatterResult::Map(properties))
}

/// `css::uno::Type` is shown as itself once its description resolves.
pub fn format_uno_type<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(match resolve_uno_type(ctx, value)? {
        Some(_) => FormatterResult::Child(value),
        None => FormatterResult::Empty,
    })
}
