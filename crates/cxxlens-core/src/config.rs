//! # Limits
//!
//! Bounds applied while decoding memory. The defaults match what a 32-bit V8
//! can hold as a string, so nothing the UI could display is cut short, while a
//! corrupt length field still cannot trigger an unbounded scan.

/// Maximum number of bytes decoded for one string (V8's 32-bit string limit).
pub const MAX_STRING_LEN: u32 = (1 << 28) - 16;

/// Block size used when scanning for a null terminator.
pub const PAGE_SIZE: u32 = 1 << 12;

/// Pointer values below this address are treated as integers, not pointers.
pub const SAFE_HEAP_START: u32 = 1 << 10;

/// Maximum number of children produced for one container.
pub const MAX_ELEMENTS: u32 = 1 << 20;

/// Decoding limits for one formatter engine
///
/// ## Example
///
/// ```rust
/// use cxxlens_core::config::{Limits, PAGE_SIZE};
///
/// let limits = Limits::default().with_page_size(100);
/// assert_eq!(limits.page_size, 128); // rounded up to a power of two
/// assert_eq!(Limits::default().page_size, PAGE_SIZE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits
{
    /// Longest string, in bytes, that will be decoded
    pub max_string_len: u32,
    /// Bytes read per step while searching for a terminator
    pub page_size: u32,
    /// Lowest address a `char *` is dereferenced at
    pub safe_heap_start: u32,
    /// Most children a vector or sequence expands to
    pub max_elements: u32,
}

impl Default for Limits
{
    fn default() -> Self
    {
        Self {
            max_string_len: MAX_STRING_LEN,
            page_size: PAGE_SIZE,
            safe_heap_start: SAFE_HEAP_START,
            max_elements: MAX_ELEMENTS,
        }
    }
}

impl Limits
{
    /// Set the string length cap.
    #[must_use]
    pub fn with_max_string_len(mut self, max_string_len: u32) -> Self
    {
        self.max_string_len = max_string_len;
        self
    }

    /// Set the scan page size.
    ///
    /// The size is rounded up to a power of two of at least 4 bytes so every
    /// page holds a whole number of characters of any width.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self
    {
        self.page_size = page_size.max(4).next_power_of_two();
        self
    }

    /// Set the lowest address treated as a real pointer.
    #[must_use]
    pub fn with_safe_heap_start(mut self, safe_heap_start: u32) -> Self
    {
        self.safe_heap_start = safe_heap_start;
        self
    }

    /// Set the container expansion cap.
    #[must_use]
    pub fn with_max_elements(mut self, max_elements: u32) -> Self
    {
        self.max_elements = max_elements;
        self
    }
}
