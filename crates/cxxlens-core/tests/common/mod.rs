//! Shared fixtures: wasm32 layouts for the types the formatters know about,
//! and helpers that lay out records in a [`LinearMemory`].

#![allow(dead_code)]

use std::cell::Cell;

use cxxlens_core::memory::{LinearMemory, WasmInterface};
use cxxlens_core::types::{Address, Member, TypeInfo, TypeTable};
use cxxlens_core::{Result, Value};

/// Memory that counts how often it is read
pub struct CountingMemory
{
    memory: LinearMemory,
    reads: Cell<usize>,
}

impl CountingMemory
{
    pub fn new(memory: LinearMemory) -> Self
    {
        Self {
            memory,
            reads: Cell::new(0),
        }
    }

    pub fn reads(&self) -> usize
    {
        self.reads.get()
    }
}

impl WasmInterface for CountingMemory
{
    fn read_memory(&self, address: Address, length: u32) -> Result<Vec<u8>>
    {
        self.reads.set(self.reads.get() + 1);
        self.memory.read_memory(address, length)
    }
}

/// A value of the named type at `address`, panicking on unknown names.
pub fn value<'a>(memory: &'a dyn WasmInterface, types: &'a TypeTable, address: u32, type_name: &str) -> Value<'a>
{
    Value::of_type(memory, types, Address::new(address), type_name).unwrap()
}

/// Every fixture layout.
pub fn types() -> TypeTable
{
    let mut types = TypeTable::new();
    types.extend(primitives());
    types.extend(libcxx_string("std::__2::string", "char", 1, 11, true));
    types.extend(libcxx_string("std::__2::u16string", "char16_t", 2, 5, false));
    types.extend(libcxx_string("std::__2::wstring", "wchar_t", 4, 2, false));
    types.extend(containers());
    types.extend(rtl());
    types.extend(uno());
    types
}

fn primitives() -> Vec<TypeInfo>
{
    vec![
        TypeInfo::scalar("bool", 1),
        TypeInfo::scalar("uint8_t", 1),
        TypeInfo::scalar("int8_t", 1),
        TypeInfo::scalar("char", 1),
        TypeInfo::scalar("uint16_t", 2),
        TypeInfo::scalar("int16_t", 2),
        TypeInfo::scalar("uint32_t", 4),
        TypeInfo::scalar("int32_t", 4),
        TypeInfo::scalar("uint64_t", 8),
        TypeInfo::scalar("int64_t", 8),
        TypeInfo::scalar("float", 4),
        TypeInfo::scalar("double", 8),
        TypeInfo::scalar("char16_t", 2).with_alias("sal_Unicode"),
        TypeInfo::scalar("char32_t", 4),
        TypeInfo::scalar("wchar_t", 4),
        TypeInfo::scalar("unsigned __int128", 16),
        TypeInfo::scalar("__int128", 16),
        TypeInfo::scalar("__externref_t", 8),
        TypeInfo::pointer("char *", "char"),
        TypeInfo::pointer("char16_t *", "char16_t"),
        TypeInfo::pointer("wchar_t *", "wchar_t"),
        TypeInfo::pointer("int32_t *", "int32_t"),
        TypeInfo::pointer("void *", "void"),
    ]
}

/// libc++ alternate string layout: `__long { __cap_, __size_, __data_ }` and
/// a short record whose first byte is the size, optionally wrapped in an
/// anonymous union.
fn libcxx_string(name: &str, unit: &str, unit_size: u32, inline_units: u32, size_union: bool) -> Vec<TypeInfo>
{
    let long = format!("{name}::__long");
    let short = format!("{name}::__short");
    let short_union = format!("{name}::__short::<union>");
    let rep = format!("{name}::__rep");
    let rep_union = format!("{name}::__rep::<union>");
    let pair = format!("{name}::__compressed_pair");
    let inline = format!("{unit}[{inline_units}]");

    let short_members = if size_union {
        vec![Member::new("<union>", short_union.as_str(), 0), Member::new("__data_", inline.as_str(), 1)]
    } else {
        vec![
            Member::new("__size_", "uint8_t", 0),
            Member::new("__data_", inline.as_str(), unit_size),
        ]
    };

    vec![
        TypeInfo::array(inline.as_str(), unit, Some(inline_units), inline_units * unit_size),
        TypeInfo::structure(short_union.as_str(), 1, vec![Member::new("__size_", "uint8_t", 0)]),
        TypeInfo::structure(short.as_str(), 12, short_members),
        TypeInfo::structure(
            long.as_str(),
            12,
            vec![
                Member::new("__cap_", "uint32_t", 0),
                Member::new("__size_", "uint32_t", 4),
                Member::new("__data_", format!("{unit} *"), 8),
            ],
        ),
        TypeInfo::structure(
            rep_union.as_str(),
            12,
            vec![Member::new("__l", long.as_str(), 0), Member::new("__s", short.as_str(), 0)],
        ),
        TypeInfo::structure(rep.as_str(), 12, vec![Member::new("<union>", rep_union.as_str(), 0)]),
        TypeInfo::structure(pair.as_str(), 12, vec![Member::new("__value_", rep.as_str(), 0)]),
        TypeInfo::structure(name, 12, vec![Member::new("__r_", pair.as_str(), 0)]),
    ]
}

fn containers() -> Vec<TypeInfo>
{
    vec![
        TypeInfo::structure(
            "std::__2::vector<int32_t, std::__2::allocator<int32_t> >",
            12,
            vec![
                Member::new("__begin_", "int32_t *", 0),
                Member::new("__end_", "int32_t *", 4),
                Member::new("__end_cap_", "int32_t *", 8),
            ],
        ),
        TypeInfo::array("int32_t[]", "int32_t", None, 0),
    ]
}

fn rtl() -> Vec<TypeInfo>
{
    vec![
        TypeInfo::array("char[1]", "char", Some(1), 1),
        TypeInfo::array("sal_Unicode[1]", "sal_Unicode", Some(1), 2),
        TypeInfo::structure(
            "_rtl_String",
            12,
            vec![
                Member::new("refCount", "int32_t", 0),
                Member::new("length", "int32_t", 4),
                Member::new("buffer", "char[1]", 8),
            ],
        )
        .with_alias("rtl_String"),
        TypeInfo::structure(
            "_rtl_uString",
            12,
            vec![
                Member::new("refCount", "int32_t", 0),
                Member::new("length", "int32_t", 4),
                Member::new("buffer", "sal_Unicode[1]", 8),
            ],
        )
        .with_alias("rtl_uString"),
        TypeInfo::pointer("rtl_String *", "_rtl_String"),
        TypeInfo::pointer("rtl_uString *", "_rtl_uString"),
        TypeInfo::structure("rtl::OString", 4, vec![Member::new("pData", "rtl_String *", 0)]),
        TypeInfo::structure("rtl::OUString", 4, vec![Member::new("pData", "rtl_uString *", 0)]),
    ]
}

pub const TYPE_REF: &str = "_typelib_TypeDescriptionReference";
pub const TYPE_DESC: &str = "_typelib_TypeDescription";
pub const POINT: &str = "com::sun::star::awt::Point";

fn uno() -> Vec<TypeInfo>
{
    vec![
        TypeInfo::structure(
            TYPE_REF,
            24,
            vec![
                Member::new("nRefCount", "int32_t", 0),
                Member::new("nStaticRefCount", "int32_t", 4),
                Member::new("eTypeClass", "uint32_t", 8),
                Member::new("pTypeName", "rtl_uString *", 12),
                Member::new("pType", "_typelib_TypeDescription *", 16),
                Member::new("pUniqueIdentifier", "void *", 20),
            ],
        ),
        TypeInfo::pointer("_typelib_TypeDescriptionReference *", TYPE_REF),
        TypeInfo::structure(
            TYPE_DESC,
            16,
            vec![
                Member::new("nRefCount", "int32_t", 0),
                Member::new("eTypeClass", "uint32_t", 4),
                Member::new("pTypeName", "rtl_uString *", 8),
                Member::new("pSelf", "_typelib_TypeDescription *", 12),
            ],
        ),
        TypeInfo::pointer("_typelib_TypeDescription *", TYPE_DESC),
        TypeInfo::structure(
            "_typelib_IndirectTypeDescription",
            20,
            vec![
                Member::new("aBase", TYPE_DESC, 0),
                Member::new("pType", "_typelib_TypeDescriptionReference *", 16),
            ],
        ),
        TypeInfo::structure(
            "_typelib_CompoundTypeDescription",
            24,
            vec![
                Member::new("aBase", TYPE_DESC, 0),
                Member::new("pBaseTypeDescription", "void *", 16),
                Member::new("nMembers", "int32_t", 20),
            ],
        ),
        TypeInfo::structure(
            "_typelib_StructTypeDescription",
            28,
            vec![
                Member::new("aBase", "_typelib_CompoundTypeDescription", 0),
                Member::new("pParameterizedTypes", "void *", 24),
            ],
        ),
        TypeInfo::structure(
            "com::sun::star::uno::Type",
            4,
            vec![Member::new("_pType", "_typelib_TypeDescriptionReference *", 0)],
        ),
        TypeInfo::structure(
            "_uno_Any",
            12,
            vec![
                Member::new("pType", "_typelib_TypeDescriptionReference *", 0),
                Member::new("pData", "void *", 4),
                Member::new("pReserved", "void *", 8),
            ],
        )
        .with_alias("com::sun::star::uno::Any"),
        TypeInfo::structure(
            "_sal_Sequence",
            12,
            vec![
                Member::new("nRefCount", "int32_t", 0),
                Member::new("nElements", "int32_t", 4),
                Member::new("elements", "char[1]", 8),
            ],
        ),
        TypeInfo::pointer("_sal_Sequence *", "_sal_Sequence"),
        TypeInfo::structure(
            "com::sun::star::uno::Sequence<int32_t>",
            4,
            vec![Member::new("_pSequence", "_sal_Sequence *", 0)],
        ),
        TypeInfo::structure(
            "com::sun::star::uno::Sequence<com::sun::star::beans::PropertyValue>",
            4,
            vec![Member::new("_pSequence", "_sal_Sequence *", 0)],
        ),
        TypeInfo::structure(
            "com::sun::star::beans::PropertyValue",
            24,
            vec![
                Member::new("Name", "rtl::OUString", 0),
                Member::new("Handle", "int32_t", 4),
                Member::new("Value", "com::sun::star::uno::Any", 8),
                Member::new("State", "int32_t", 20),
            ],
        ),
        TypeInfo::structure(
            "com::sun::star::uno::XInterface",
            4,
            vec![Member::new("_vptr", "void *", 0)],
        ),
        TypeInfo::pointer("com::sun::star::uno::XInterface *", "com::sun::star::uno::XInterface"),
        TypeInfo::structure(
            "com::sun::star::uno::Reference<com::sun::star::uno::XInterface>",
            4,
            vec![Member::new("_pInterface", "com::sun::star::uno::XInterface *", 0)],
        ),
        TypeInfo::structure(
            POINT,
            8,
            vec![Member::new("X", "int32_t", 0), Member::new("Y", "int32_t", 4)],
        ),
    ]
}

/*
 * Memory writers
 */

/// An `_rtl_uString` record holding `text`, terminator included.
pub fn write_ustring(memory: &mut LinearMemory, address: u32, text: &str)
{
    let units: Vec<u16> = text.encode_utf16().collect();
    memory.write_u32(Address::new(address), 1).unwrap();
    memory.write_u32(Address::new(address + 4), units.len() as u32).unwrap();
    for (index, unit) in units.iter().chain(std::iter::once(&0)).enumerate() {
        memory.write_u16(Address::new(address + 8 + 2 * index as u32), *unit).unwrap();
    }
}

/// An `_rtl_String` record holding `text`, terminator included.
pub fn write_string(memory: &mut LinearMemory, address: u32, text: &str)
{
    memory.write_u32(Address::new(address), 1).unwrap();
    memory.write_u32(Address::new(address + 4), text.len() as u32).unwrap();
    memory.write(Address::new(address + 8), text.as_bytes()).unwrap();
    memory.write(Address::new(address + 8 + text.len() as u32), &[0]).unwrap();
}

/// A `_typelib_TypeDescriptionReference`.
pub fn write_type_ref(memory: &mut LinearMemory, address: u32, type_class: u32, name: u32, description: u32)
{
    memory.write_u32(Address::new(address), 1).unwrap();
    memory.write_u32(Address::new(address + 8), type_class).unwrap();
    memory.write_u32(Address::new(address + 12), name).unwrap();
    memory.write_u32(Address::new(address + 16), description).unwrap();
}

/// A `_typelib_TypeDescription` (also the head of every derived description).
pub fn write_type_description(memory: &mut LinearMemory, address: u32, type_class: u32, name: u32)
{
    memory.write_u32(Address::new(address), 1).unwrap();
    memory.write_u32(Address::new(address + 4), type_class).unwrap();
    memory.write_u32(Address::new(address + 8), name).unwrap();
    memory.write_u32(Address::new(address + 12), address).unwrap();
}

/// A `uno_Any`.
pub fn write_any(memory: &mut LinearMemory, address: u32, type_ref: u32, data: u32)
{
    memory.write_u32(Address::new(address), type_ref).unwrap();
    memory.write_u32(Address::new(address + 4), data).unwrap();
}
