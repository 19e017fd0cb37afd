//! Scalar formatters: fixed-width numbers, characters, 128-bit integers,
//! `void` and `externref` handles.

use crate::engine::FormatContext;
use crate::error::Result;
use crate::result::{ExternRef, FormatterResult, ValueClass};
use crate::value::Value;

/// `bool`: any non-zero byte is `true`.
pub fn format_bool<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Bool(value.as_u8()? > 0))
}

/// `uint16_t`.
pub fn format_u16<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::UInt(value.as_u16()?.into()))
}

/// `uint32_t`.
pub fn format_u32<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::UInt(value.as_u32()?.into()))
}

/// `uint64_t`.
pub fn format_u64<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::UInt(value.as_u64()?))
}

/// `int16_t`.
pub fn format_i16<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Int(value.as_i16()?.into()))
}

/// `int32_t`.
pub fn format_i32<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Int(value.as_i32()?.into()))
}

/// `int64_t`.
pub fn format_i64<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Int(value.as_i64()?))
}

/// `float`, widened to `f64`.
pub fn format_f32<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Float(value.as_f32()?.into()))
}

/// `double`.
pub fn format_f64<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Float(value.as_f64()?))
}

/// `void` renders as the `<void>` marker.
pub fn format_void<'a>(_ctx: &FormatContext<'_>, _value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Void)
}

/// `uint8_t` / `int8_t` as a quoted C character literal.
///
/// Signed bytes are shown by magnitude.
pub fn format_char<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let code = if value.type_info().has_name("int8_t") {
        value.as_i8()?.unsigned_abs()
    } else {
        value.as_u8()?
    };
    Ok(FormatterResult::Text(char_literal(code)))
}

/// Quote a byte as a C character literal, escaping anything non-printable.
///
/// ```rust
/// use cxxlens_core::formatters::primitive::char_literal;
///
/// assert_eq!(char_literal(b'a'), "'a'");
/// assert_eq!(char_literal(b'\n'), "'\\n'");
/// assert_eq!(char_literal(0x80), "'\\x80'");
/// ```
pub fn char_literal(code: u8) -> String
{
    let escaped = match code {
        0x00 => "\\0",
        0x07 => "\\a",
        0x08 => "\\b",
        0x09 => "\\t",
        0x0a => "\\n",
        0x0b => "\\v",
        0x0c => "\\f",
        0x0d => "\\r",
        0x20..=0x7e => return format!("'{}'", char::from(code)),
        _ => return format!("'\\x{code:02x}'"),
    };
    format!("'{escaped}'")
}

/// `wchar_t`, `char16_t`, `char32_t` as the character they encode.
///
/// Code units that are not Unicode scalar values (lone surrogates, values
/// past U+10FFFF) are shown as `U+` followed by `size * 2` hex digits.
pub fn format_wide_char<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let code = if value.size() == 2 {
        u32::from(value.as_u16()?)
    } else {
        value.as_u32()?
    };
    let text = match char::from_u32(code) {
        Some(ch) => ch.to_string(),
        None => format!("U+{code:0width$x}", width = value.size() as usize * 2),
    };
    Ok(FormatterResult::Text(text))
}

fn read_u128_bytes(value: &Value<'_>) -> Result<[u8; 16]>
{
    let bytes = value.as_bytes(0, 16)?;
    let mut array = [0u8; 16];
    array.copy_from_slice(&bytes);
    Ok(array)
}

pub fn format_u128<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::UInt128(u128::from_le_bytes(read_u128_bytes(&value)?)))
}

pub fn format_i128<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::Int128(i128::from_le_bytes(read_u128_bytes(&value)?)))
}

/// Split the 64-bit `externref` encoding: class in the high word, index in the low word.
pub fn format_extern_ref<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let encoded = value.as_u64()?;
    let class = (encoded >> 32) as u32;
    Ok(FormatterResult::ExternRef(ExternRef {
        value_class: ValueClass::from_index(class),
        index: encoded as u32,
    }))
}
