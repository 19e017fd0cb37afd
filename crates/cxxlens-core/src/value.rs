//! # Values
//!
//! A [`Value`] is a typed view of one location in linear memory.
//!
//! It carries the memory it reads from, the type table its layout comes from,
//! its address, and its layout. Creating or navigating a value never touches
//! memory on its own; only the typed reads and pointer dereferences do.
//!
//! ## Failure modes
//!
//! Navigation separates two outcomes that formatters treat very differently:
//!
//! - `Ok(None)`: the field, element or pointee does not exist (missing member,
//!   unknown type, null pointer). Formatters fall back to something simpler.
//! - `Err(_)`: memory could not be read. The formatting attempt is abandoned.

use std::fmt;

use crate::error::{LensError, Result};
use crate::memory::WasmInterface;
use crate::types::{Address, TypeInfo, TypeKind, TypeTable};

/// A typed handle to a location in the debuggee's linear memory
#[derive(Clone, Copy)]
pub struct Value<'a>
{
    memory: &'a dyn WasmInterface,
    types: &'a TypeTable,
    info: &'a TypeInfo,
    location: Address,
}

impl fmt::Debug for Value<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Value")
            .field("location", &self.location)
            .field("type", &self.info.primary_name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Value<'_>
{
    fn eq(&self, other: &Self) -> bool
    {
        self.location == other.location && std::ptr::eq(self.info, other.info)
    }
}

impl<'a> Value<'a>
{
    /// Create a value of layout `info` at `location`.
    pub fn new(memory: &'a dyn WasmInterface, types: &'a TypeTable, location: Address, info: &'a TypeInfo) -> Self
    {
        Self {
            memory,
            types,
            info,
            location,
        }
    }

    /// Create a value of the type called `type_name` at `location`.
    ///
    /// ## Errors
    ///
    /// - `UnknownType`: the type table has no type by that name
    pub fn of_type(memory: &'a dyn WasmInterface, types: &'a TypeTable, location: Address, type_name: &str) -> Result<Self>
    {
        let info = types.lookup(type_name).ok_or_else(|| LensError::UnknownType(type_name.to_string()))?;
        Ok(Self::new(memory, types, location, info))
    }

    /// Address of the first byte.
    pub fn location(&self) -> Address
    {
        self.location
    }

    /// Layout this value is read through.
    pub fn type_info(&self) -> &'a TypeInfo
    {
        self.info
    }

    /// Every spelling of this value's type, most specific first.
    pub fn type_names(&self) -> &'a [String]
    {
        &self.info.names
    }

    /// Size in bytes of this value's type.
    pub fn size(&self) -> u32
    {
        self.info.size
    }

    /// Memory this value reads from.
    pub fn memory(&self) -> &'a dyn WasmInterface
    {
        self.memory
    }

    /// Type table this value navigates through.
    pub fn types(&self) -> &'a TypeTable
    {
        self.types
    }

    /// Names of the struct members, empty for non-structs.
    pub fn members(&self) -> impl Iterator<Item = &'a str>
    {
        self.info.members().iter().map(|member| member.name.as_str())
    }

    /// Whether the type has a member called `name`.
    pub fn has_member(&self, name: &str) -> bool
    {
        self.info.member(name).is_some()
    }

    fn at(&self, location: Address, info: &'a TypeInfo) -> Value<'a>
    {
        Value::new(self.memory, self.types, location, info)
    }

    /*
     * Reads
     */

    /// Read `length` bytes starting `offset` bytes past this value.
    ///
    /// The window may extend past the declared size; variable-length layouts
    /// (`char buffer[1]`) depend on that.
    ///
    /// ## Errors
    ///
    /// - `MemoryFault`: the window is not readable
    pub fn as_bytes(&self, offset: u32, length: u32) -> Result<Vec<u8>>
    {
        let start = self.location.checked_add(offset).ok_or(LensError::MemoryFault {
            address: self.location,
            length,
        })?;
        self.memory.read_memory(start, length)
    }

    /// Read the whole value (`size` bytes).
    pub fn as_data(&self) -> Result<Vec<u8>>
    {
        self.as_bytes(0, self.info.size)
    }

    fn read_array<const N: usize>(&self) -> Result<[u8; N]>
    {
        let bytes = self.as_bytes(0, N as u32)?;
        let mut array = [0u8; N];
        array.copy_from_slice(&bytes);
        Ok(array)
    }

    /// Read one unsigned byte.
    pub fn as_u8(&self) -> Result<u8>
    {
        Ok(u8::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `u16`.
    pub fn as_u16(&self) -> Result<u16>
    {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `u32`.
    pub fn as_u32(&self) -> Result<u32>
    {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `u64`.
    pub fn as_u64(&self) -> Result<u64>
    {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read one signed byte.
    pub fn as_i8(&self) -> Result<i8>
    {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `i16`.
    pub fn as_i16(&self) -> Result<i16>
    {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `i32`.
    pub fn as_i32(&self) -> Result<i32>
    {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `i64`.
    pub fn as_i64(&self) -> Result<i64>
    {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `f32`.
    pub fn as_f32(&self) -> Result<f32>
    {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a little-endian `f64`.
    pub fn as_f64(&self) -> Result<f64>
    {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /*
     * Navigation
     */

    /// Struct member `name`.
    ///
    /// Reads nothing. `None` if this is not a struct, the member does not
    /// exist, or the member's type is unknown.
    pub fn field(&self, name: &str) -> Option<Value<'a>>
    {
        let member = self.info.member(name)?;
        let info = self.types.lookup(&member.type_name)?;
        Some(self.at(self.location + member.offset, info))
    }

    /// The value a pointer points at.
    ///
    /// `None` for non-pointers, null pointers and unknown pointee types.
    pub fn deref(&self) -> Result<Option<Value<'a>>>
    {
        let TypeKind::Pointer { pointee } = &self.info.kind else {
            return Ok(None);
        };
        let target = self.as_u32()?;
        if target == 0 {
            return Ok(None);
        }
        Ok(self.types.lookup(pointee).map(|info| self.at(Address::new(target), info)))
    }

    /// Element `index`.
    ///
    /// - arrays: the element at `index`, unchecked against the declared count
    ///   so trailing `T data[1]` buffers can be walked
    /// - pointers: `pointer[index]`
    /// - structs: the member at position `index`
    pub fn element(&self, index: u32) -> Result<Option<Value<'a>>>
    {
        match &self.info.kind {
            TypeKind::Array { element, .. } => {
                let Some(info) = self.types.lookup(element) else {
                    return Ok(None);
                };
                Ok(offset_by(self.location, index, info.size).map(|location| self.at(location, info)))
            }
            TypeKind::Pointer { pointee } => {
                let Some(info) = self.types.lookup(pointee) else {
                    return Ok(None);
                };
                let base = self.as_u32()?;
                if base == 0 {
                    return Ok(None);
                }
                Ok(offset_by(Address::new(base), index, info.size).map(|location| self.at(location, info)))
            }
            TypeKind::Struct { members } => {
                Ok(members.get(index as usize).and_then(|member| self.field(&member.name)))
            }
            TypeKind::Scalar => Ok(None),
        }
    }

    /// Follow a dotted path of member names.
    ///
    /// `*` dereferences a pointer and a number indexes an element, so
    /// `"__r_.__value_.<union>.__l"` and `"pType.*.eTypeClass"` are both valid.
    pub fn child(&self, path: &str) -> Result<Option<Value<'a>>>
    {
        let mut current = *self;
        for segment in path.split('.') {
            let next = if segment == "*" {
                current.deref()?
            } else if let Ok(index) = segment.parse::<u32>() {
                current.element(index)?
            } else {
                current.field(segment)
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Like [`Value::child`], but a missing path is an error.
    ///
    /// ## Errors
    ///
    /// - `MissingField`: the path does not resolve
    /// - `MemoryFault`: a pointer along the path could not be read
    pub fn require(&self, path: &str) -> Result<Value<'a>>
    {
        self.child(path)?.ok_or_else(|| LensError::MissingField {
            field: path.to_string(),
            type_name: self.info.primary_name().to_string(),
        })
    }

    /// Reinterpret this location as the type called `type_name`.
    pub fn cast_to(&self, type_name: &str) -> Option<Value<'a>>
    {
        self.types.lookup(type_name).map(|info| self.at(self.location, info))
    }

    /// Element `index` of this pointer or array, reinterpreted as `type_name`.
    ///
    /// The stride is the size of `type_name`, not of the declared element type,
    /// which is what makes `void *` and `char elements[1]` usable.
    pub fn cast_child_at_index_to(&self, index: u32, type_name: &str) -> Result<Option<Value<'a>>>
    {
        let Some(info) = self.types.lookup(type_name) else {
            return Ok(None);
        };
        let base = if self.info.is_pointer() {
            let target = self.as_u32()?;
            if target == 0 {
                return Ok(None);
            }
            Address::new(target)
        } else {
            self.location
        };
        Ok(offset_by(base, index, info.size).map(|location| self.at(location, info)))
    }
}

fn offset_by(base: Address, index: u32, stride: u32) -> Option<Address>
{
    index.checked_mul(stride).and_then(|offset| base.checked_add(offset))
}
