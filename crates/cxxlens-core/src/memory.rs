//! # Linear Memory Access
//!
//! The one capability every formatter needs from the debugger host: reading
//! bytes out of the paused wasm instance.
//!
//! - [`WasmInterface`]: the host-side trait
//! - [`LinearMemory`]: a flat byte vector, the shape of a wasm32 memory (snapshots, tests)
//! - [`CachedMemory`]: read-through page cache for hosts where each read is a round trip
//!
//! Reads are blocking. The debuggee has to stay paused for the whole render so
//! a child value observes the same memory as its parent.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::error::{LensError, Result};
use crate::types::Address;

/// Memory access supplied by the debugger host
///
/// Implementations must return exactly `length` bytes or an error; a short
/// read is a fault, not a partial success.
pub trait WasmInterface
{
    /// Read `length` bytes starting at `address`.
    ///
    /// ## Errors
    ///
    /// - `MemoryFault`: any part of the range is outside accessible memory
    fn read_memory(&self, address: Address, length: u32) -> Result<Vec<u8>>;
}

impl<T: WasmInterface + ?Sized> WasmInterface for &T
{
    fn read_memory(&self, address: Address, length: u32) -> Result<Vec<u8>>
    {
        (**self).read_memory(address, length)
    }
}

/// Zero-based linear memory held in a byte vector
///
/// ## Example
///
/// ```rust
/// use cxxlens_core::memory::{LinearMemory, WasmInterface};
/// use cxxlens_core::types::Address;
///
/// let mut memory = LinearMemory::new(64);
/// memory.write(Address::new(8), b"hi").unwrap();
/// assert_eq!(memory.read_memory(Address::new(8), 2).unwrap(), b"hi");
/// assert!(memory.read_memory(Address::new(63), 2).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearMemory
{
    bytes: Vec<u8>,
}

impl LinearMemory
{
    /// Create `size` bytes of zeroed memory.
    pub fn new(size: u32) -> Self
    {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    /// Wrap existing bytes; byte 0 is address 0.
    pub fn from_bytes(bytes: Vec<u8>) -> Self
    {
        Self { bytes }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize
    {
        self.bytes.len()
    }

    /// Whether the memory has no bytes at all.
    pub fn is_empty(&self) -> bool
    {
        self.bytes.is_empty()
    }

    fn range(&self, address: Address, length: usize) -> Result<std::ops::Range<usize>>
    {
        let fault = || LensError::MemoryFault {
            address,
            length: u32::try_from(length).unwrap_or(u32::MAX),
        };
        let start = address.value() as usize;
        let end = start.checked_add(length).ok_or_else(fault)?;
        if end > self.bytes.len() {
            return Err(fault());
        }
        Ok(start..end)
    }

    /// Copy `data` into memory at `address`.
    ///
    /// ## Errors
    ///
    /// - `MemoryFault`: the range does not fit in memory
    pub fn write(&mut self, address: Address, data: &[u8]) -> Result<()>
    {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    /// Write a little-endian `u16`.
    pub fn write_u16(&mut self, address: Address, value: u16) -> Result<()>
    {
        self.write(address, &value.to_le_bytes())
    }

    /// Write a little-endian `u32`.
    pub fn write_u32(&mut self, address: Address, value: u32) -> Result<()>
    {
        self.write(address, &value.to_le_bytes())
    }

    /// Write a little-endian `u64`.
    pub fn write_u64(&mut self, address: Address, value: u64) -> Result<()>
    {
        self.write(address, &value.to_le_bytes())
    }
}

impl WasmInterface for LinearMemory
{
    fn read_memory(&self, address: Address, length: u32) -> Result<Vec<u8>>
    {
        let range = self.range(address, length as usize)?;
        Ok(self.bytes[range].to_vec())
    }
}

fn page_align_down(value: u32, page_size: u32) -> u32
{
    value & !(page_size - 1)
}

/// Read-through cache that stores pages fetched from the host
///
/// Formatting one value touches the same few cache lines repeatedly (a string
/// header, then its buffer, then the next field). Each host read can be a round
/// trip to the debuggee, so whole pages are fetched once and served locally.
///
/// The cache is only valid while the debuggee stays paused; call
/// [`CachedMemory::clear`] whenever it resumes.
///
/// ## Thread Safety
///
/// Not thread-safe; the engine formats on a single thread.
#[derive(Debug)]
pub struct CachedMemory<M>
{
    inner: M,
    page_size: u32,
    pages: RefCell<HashMap<u32, Rc<Vec<u8>>>>,
}

impl<M: WasmInterface> CachedMemory<M>
{
    /// Wrap `inner` with 4 KiB pages.
    pub fn new(inner: M) -> Self
    {
        Self::with_page_size(inner, crate::config::PAGE_SIZE)
    }

    /// Wrap `inner` with a custom page size (rounded up to a power of two, at least 64 bytes).
    pub fn with_page_size(inner: M, page_size: u32) -> Self
    {
        Self {
            inner,
            page_size: page_size.max(64).next_power_of_two(),
            pages: RefCell::new(HashMap::new()),
        }
    }

    /// The wrapped memory.
    pub fn inner(&self) -> &M
    {
        &self.inner
    }

    /// Page size in bytes.
    pub fn page_size(&self) -> u32
    {
        self.page_size
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize
    {
        self.pages.borrow().len()
    }

    /// Clears all cached pages.
    pub fn clear(&self)
    {
        self.pages.borrow_mut().clear();
    }

    /// Invalidates any cached pages overlapping the provided range.
    pub fn invalidate_range(&self, address: Address, length: u32)
    {
        if length == 0 {
            return;
        }
        let end = u64::from(address.value()) + u64::from(length);
        let mut pages = self.pages.borrow_mut();
        let mut base = u64::from(page_align_down(address.value(), self.page_size));
        while base < end {
            // base never exceeds the u32 range: it starts aligned below a u32 address
            pages.remove(&(base as u32));
            base += u64::from(self.page_size);
        }
    }

    /// Fetch a whole page, or `None` if the page runs past accessible memory.
    fn fetch_page(&self, base: u32) -> Option<Rc<Vec<u8>>>
    {
        if let Some(existing) = self.pages.borrow().get(&base) {
            return Some(existing.clone());
        }

        match self.inner.read_memory(Address::new(base), self.page_size) {
            Ok(data) => {
                let page = Rc::new(data);
                self.pages.borrow_mut().insert(base, page.clone());
                Some(page)
            }
            Err(err) => {
                trace!(base = %Address::new(base), %err, "page not cacheable, reading directly");
                None
            }
        }
    }
}

impl<M: WasmInterface> WasmInterface for CachedMemory<M>
{
    fn read_memory(&self, address: Address, length: u32) -> Result<Vec<u8>>
    {
        if length == 0 {
            return Ok(Vec::new());
        }
        address.checked_add(length - 1).ok_or(LensError::MemoryFault { address, length })?;

        let mut output = Vec::with_capacity(length as usize);
        let mut copied = 0u32;
        while copied < length {
            let absolute = address.value() + copied;
            let page_base = page_align_down(absolute, self.page_size);
            let page_offset = absolute - page_base;
            let chunk = (length - copied).min(self.page_size - page_offset);

            match self.fetch_page(page_base) {
                Some(page) => {
                    let start = page_offset as usize;
                    output.extend_from_slice(&page[start..start + chunk as usize]);
                }
                None => {
                    // Page straddles the end of memory; let the host decide on the exact range.
                    let bytes = self.inner.read_memory(Address::new(absolute), chunk)?;
                    output.extend_from_slice(&bytes);
                }
            }
            copied += chunk;
        }

        Ok(output)
    }
}
