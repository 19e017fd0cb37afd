//! # String Formatters
//!
//! Three unrelated string ABIs are decoded here:
//!
//! - **libc++ `basic_string`**: short strings live inline and a set high bit
//!   in the size byte of the short record marks a heap allocation described
//!   by the long record (`__data_`, `__size_`)
//! - **Raw `char *`**: null-terminated, found by reading memory one page at a
//!   time up to [`Limits::max_string_len`](crate::config::Limits)
//! - **RTL strings**: a `length` field followed by an inline `buffer`; a set
//!   high bit in `length` sends decoding through the buffer's first word as a
//!   pointer
//!
//! The two high-bit conventions look alike but belong to different layouts
//! and are kept as separate code paths.

use tracing::{debug, trace};

use crate::engine::FormatContext;
use crate::error::Result;
use crate::formatters::containers;
use crate::result::FormatterResult;
use crate::types::Address;
use crate::value::Value;

/// Width of one character code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharWidth
{
    /// 8-bit units decoded as UTF-8
    Narrow = 1,
    /// 16-bit units decoded as UTF-16LE
    Utf16 = 2,
    /// 32-bit units, each taken as one code point
    Wide = 4,
}

impl CharWidth
{
    /// Bytes per code unit.
    pub fn bytes(self) -> u32
    {
        self as u32
    }

    /// Decode little-endian code units.
    ///
    /// Malformed input never fails: invalid sequences and out-of-range code
    /// points become U+FFFD, and a trailing partial unit is ignored.
    ///
    /// ```rust
    /// use cxxlens_core::formatters::strings::CharWidth;
    ///
    /// assert_eq!(CharWidth::Utf16.decode(&[b'h', 0, b'i', 0]), "hi");
    /// assert_eq!(CharWidth::Wide.decode(&[0x00, 0xd8, 0, 0]), "\u{fffd}");
    /// ```
    pub fn decode(self, bytes: &[u8]) -> String
    {
        match self {
            CharWidth::Narrow => String::from_utf8_lossy(bytes).into_owned(),
            CharWidth::Utf16 => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            }
            CharWidth::Wide => bytes
                .chunks_exact(4)
                .map(|unit| u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]))
                .map(|code| char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect(),
        }
    }

    /// Byte offset of the first all-zero code unit.
    pub fn find_terminator(self, bytes: &[u8]) -> Option<usize>
    {
        let width = self.bytes() as usize;
        bytes
            .chunks_exact(width)
            .position(|unit| unit.iter().all(|byte| *byte == 0))
            .map(|index| index * width)
    }
}

/*
 * libc++
 */

fn decode_libcxx_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>, width: CharWidth) -> Result<FormatterResult<'a>>
{
    let short = value.require("__r_.__value_.<union>.__s")?;
    let flag = if short.has_member("<union>") {
        short.require("<union>.__size_")?.as_u8()?
    } else {
        short.require("__size_")?.as_u8()?
    };

    if flag & 0x80 != 0 {
        let long = value.require("__r_.__value_.<union>.__l")?;
        let data = long.require("__data_")?.as_u32()?;
        let size = long.require("__size_")?.as_u32()?;

        let byte_len = size.saturating_mul(width.bytes()).min(ctx.limits().max_string_len);
        trace!(data = %Address::new(data), size, byte_len, "decoding long libc++ string");
        let bytes = ctx.wasm().read_memory(Address::new(data), byte_len)?;
        return Ok(FormatterResult::SizedText {
            size,
            text: width.decode(&bytes),
        });
    }

    let size = u32::from(flag & 0x7f);
    let bytes = short.require("__data_")?.as_bytes(0, size * width.bytes())?;
    Ok(FormatterResult::SizedText {
        size,
        text: width.decode(&bytes),
    })
}

/// `std::string` and `std::u8string`.
pub fn format_libcxx_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    decode_libcxx_string(ctx, value, CharWidth::Narrow)
}

/// `std::u16string`.
pub fn format_libcxx_u16string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    decode_libcxx_string(ctx, value, CharWidth::Utf16)
}

/// `std::wstring` and `std::u32string`; `wchar_t` is 4 bytes on wasm.
pub fn format_libcxx_wstring<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    decode_libcxx_string(ctx, value, CharWidth::Wide)
}

/*
 * Raw strings
 */

fn scan_raw_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>, width: CharWidth) -> Result<FormatterResult<'a>>
{
    let limits = ctx.limits();
    let address = value.as_u32()?;
    if address < limits.safe_heap_start {
        return containers::format_pointer_or_reference(ctx, value);
    }

    let start = Address::new(address);
    let mut collected = Vec::new();
    let mut offset = 0u32;
    let mut window = limits.page_size;
    while offset < limits.max_string_len {
        let Some(page_start) = start.checked_add(offset) else {
            break;
        };
        let page = match ctx.wasm().read_memory(page_start, window) {
            Ok(page) => page,
            // Near the end of memory: shrink the window down to one character
            Err(err) if window > width.bytes() => {
                trace!(address = %page_start, window, %err, "shrinking scan window");
                window /= 2;
                continue;
            }
            Err(err) if collected.is_empty() => return Err(err),
            Err(_) => break,
        };
        if let Some(end) = width.find_terminator(&page) {
            collected.extend_from_slice(&page[..end]);
            return Ok(FormatterResult::Text(width.decode(&collected)));
        }
        collected.extend_from_slice(&page);

        let Some(next) = offset.checked_add(window) else {
            break;
        };
        offset = next;
    }

    debug!(address = %start, scanned = collected.len(), "no terminator found, showing pointer");
    containers::format_pointer_or_reference(ctx, value)
}

/// `char *` and `char8_t *`.
pub fn format_c_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    scan_raw_string(ctx, value, CharWidth::Narrow)
}

/// `char16_t *`.
pub fn format_u16_c_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    scan_raw_string(ctx, value, CharWidth::Utf16)
}

/// `wchar_t *` and `char32_t *`.
pub fn format_wide_c_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    scan_raw_string(ctx, value, CharWidth::Wide)
}

/*
 * RTL
 */

fn decode_rtl_buffer<'a>(ctx: &FormatContext<'_>, value: Value<'a>, width: CharWidth) -> Result<FormatterResult<'a>>
{
    let length = match value.field("length") {
        Some(length) => length.as_u32()?,
        None => 0,
    };
    let Some(buffer) = value.field("buffer") else {
        return Ok(FormatterResult::Text(String::new()));
    };
    if length == 0 || buffer.as_u32()? == 0 {
        return Ok(FormatterResult::Text(String::new()));
    }

    if length & 0x80 != 0 {
        let data = Address::new(buffer.as_u32()?);
        let byte_len = length.saturating_mul(width.bytes()).min(ctx.limits().max_string_len);
        let bytes = ctx.wasm().read_memory(data, byte_len)?;
        return Ok(FormatterResult::SizedText {
            size: length,
            text: width.decode(&bytes),
        });
    }

    let byte_len = length.saturating_mul(width.bytes()).min(ctx.limits().max_string_len);
    let bytes = buffer.as_bytes(0, byte_len)?;
    Ok(FormatterResult::Text(width.decode(&bytes)))
}

/// Decoded contents of an `_rtl_String` / `_rtl_uString` record.
pub(crate) fn rtl_text(ctx: &FormatContext<'_>, value: Value<'_>, width: CharWidth) -> Result<String>
{
    Ok(match decode_rtl_buffer(ctx, value, width)? {
        FormatterResult::Text(text) | FormatterResult::SizedText { text, .. } => text,
        _ => String::new(),
    })
}

/// `_rtl_String` and `rtl::OStringBuffer`.
pub fn format_rtl_string<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    decode_rtl_buffer(ctx, value, CharWidth::Narrow)
}

/// `_rtl_uString` and `rtl::OUStringBuffer`.
pub fn format_rtl_ustring<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    decode_rtl_buffer(ctx, value, CharWidth::Utf16)
}

/// `rtl::OString` and `rtl::OUString` expand to their `pData` record, which
/// the RTL buffer formatters then decode.
pub fn format_rtl_object_string<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(value.field("pData").map_or(FormatterResult::Empty, FormatterResult::Child))
}

/// `rtl_uString *` and `rtl_String *` expand to the record they point at.
pub fn format_rtl_string_pointer<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(value.deref()?.map_or(FormatterResult::Empty, FormatterResult::Child))
}
