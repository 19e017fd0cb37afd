//! Vectors, pointers and dynamic arrays.
//!
//! None of these read the elements themselves; they hand back child values
//! for the host to expand when the user opens them.

use tracing::warn;

use crate::engine::FormatContext;
use crate::error::Result;
use crate::result::FormatterResult;
use crate::types::TypeKind;
use crate::value::Value;

/// libc++ `std::vector<T>` as the elements between `__begin_` and `__end_`.
///
/// At most [`Limits::max_elements`](crate::config::Limits) children are
/// produced.
pub fn format_vector<'a>(ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let begin = value.require("__begin_")?;
    let end = value.require("__end_")?;

    let element_size = match &begin.type_info().kind {
        TypeKind::Pointer { pointee } => value.types().lookup(pointee).map_or(0, |info| info.size),
        _ => 0,
    };
    if element_size == 0 {
        return Ok(FormatterResult::Array(Vec::new()));
    }

    let count = end.as_u32()?.saturating_sub(begin.as_u32()?) / element_size;
    let limit = ctx.limits().max_elements;
    if count > limit {
        warn!(location = %value.location(), count, limit, "vector truncated");
    }

    let mut elements = Vec::with_capacity(count.min(limit) as usize);
    for index in 0..count.min(limit) {
        if let Some(element) = begin.element(index)? {
            elements.push(element);
        }
    }
    Ok(FormatterResult::Array(elements))
}

/// Any pointer or reference as `{ "0x<address>": pointee }`; null is `{ "0x0": null }`.
pub fn format_pointer_or_reference<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    let address = value.as_u32()?;
    if address == 0 {
        return Ok(FormatterResult::pointer_box(0, None));
    }
    Ok(FormatterResult::pointer_box(address, value.deref()?))
}

/// `T[]` as its first element, keyed by the array's own address.
pub fn format_dynamic_array<'a>(_ctx: &FormatContext<'_>, value: Value<'a>) -> Result<FormatterResult<'a>>
{
    Ok(FormatterResult::pointer_box(value.location().value(), value.element(0)?))
}
