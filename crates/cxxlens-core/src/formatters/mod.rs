//! # Built-in Formatters
//!
//! - [`primitive`]: numbers, characters, 128-bit integers, `void`, `externref`
//! - [`strings`]: libc++ strings, raw C strings, RTL strings
//! - [`containers`]: vectors, pointers, dynamic arrays
//! - [`uno`]: UNO `Any`, `Reference`, `Sequence`, `Type` and type resolution
//!
//! [`register_defaults`] installs them in precedence order.

pub mod containers;
pub mod primitive;
pub mod strings;
pub mod uno;

use crate::error::Result;
use crate::registry::{FormatterRegistry, TypeMatcher};

/// Register the built-in formatters.
///
/// Order matters: string pointers before the generic pointer formatter, the
/// `PropertyValue` sequence before the generic sequence.
///
/// ## Errors
///
/// - `InvalidPattern`: a pattern failed to compile
pub fn register_defaults(registry: &mut FormatterRegistry) -> Result<()>
{
    // Numbers
    registry.register("bool", TypeMatcher::exact(["bool"]), primitive::format_bool);
    registry.register("uint16_t", TypeMatcher::exact(["uint16_t"]), primitive::format_u16);
    registry.register("uint32_t", TypeMatcher::exact(["uint32_t"]), primitive::format_u32);
    registry.register("uint64_t", TypeMatcher::exact(["uint64_t"]), primitive::format_u64);
    registry.register("int16_t", TypeMatcher::exact(["int16_t"]), primitive::format_i16);
    registry.register("int32_t", TypeMatcher::exact(["int32_t"]), primitive::format_i32);
    registry.register("int64_t", TypeMatcher::exact(["int64_t"]), primitive::format_i64);
    registry.register("float", TypeMatcher::exact(["float"]), primitive::format_f32);
    registry.register("double", TypeMatcher::exact(["double"]), primitive::format_f64);
    registry.register("void", TypeMatcher::exact(["void"]), primitive::format_void);

    // Characters
    registry.register("char8", TypeMatcher::exact(["uint8_t", "int8_t"]), primitive::format_char);
    registry.register(
        "wide-char",
        TypeMatcher::exact(["wchar_t", "char32_t", "char16_t"]),
        primitive::format_wide_char,
    );

    // libc++ strings
    registry.register(
        "libcxx-string",
        TypeMatcher::exact([
            "std::__2::string",
            "std::__2::basic_string<char, std::__2::char_traits<char>, std::__2::allocator<char> >",
            "std::__2::u8string",
            "std::__2::basic_string<char8_t, std::__2::char_traits<char8_t>, std::__2::allocator<char8_t> >",
        ]),
        strings::format_libcxx_string,
    );
    registry.register(
        "libcxx-u16string",
        TypeMatcher::exact([
            "std::__2::u16string",
            "std::__2::basic_string<char16_t, std::__2::char_traits<char16_t>, std::__2::allocator<char16_t> >",
        ]),
        strings::format_libcxx_u16string,
    );
    registry.register(
        "libcxx-wstring",
        TypeMatcher::exact([
            "std::__2::wstring",
            "std::__2::basic_string<wchar_t, std::__2::char_traits<wchar_t>, std::__2::allocator<wchar_t> >",
            "std::__2::u32string",
            "std::__2::basic_string<char32_t, std::__2::char_traits<char32_t>, std::__2::allocator<char32_t> >",
        ]),
        strings::format_libcxx_wstring,
    );

    // RTL strings
    registry.register(
        "rtl-string",
        TypeMatcher::exact(["_rtl_String", "rtl::OStringBuffer"]),
        strings::format_rtl_string,
    );
    registry.register(
        "rtl-ustring",
        TypeMatcher::exact(["_rtl_uString", "rtl::OUStringBuffer"]),
        strings::format_rtl_ustring,
    );
    registry.register("rtl-ostring", TypeMatcher::patterns(&[r"^rtl::OString$"])?, strings::format_rtl_object_string);
    registry.register("rtl-oustring", TypeMatcher::patterns(&[r"^rtl::OUString$"])?, strings::format_rtl_object_string);
    registry.register(
        "rtl-string-pointer",
        TypeMatcher::exact(["rtl_uString *", "rtl_String *"]),
        strings::format_rtl_string_pointer,
    );

    // UNO
    registry.register(
        "uno-any",
        TypeMatcher::patterns(&[r"^_uno_Any$", r"^com::sun::star::uno::Any$"])?,
        uno::format_uno_any,
    );
    registry.register(
        "uno-reference",
        TypeMatcher::patterns(&[r"^com::sun::star::uno::Reference<.+>$"])?,
        uno::format_uno_reference,
    );
    registry.register(
        "uno-property-values",
        TypeMatcher::patterns(&[r"^com::sun::star::uno::Sequence<com::sun::star::beans::PropertyValue>$"])?,
        uno::format_uno_sequence_property_value,
    );
    registry.register(
        "uno-sequence",
        TypeMatcher::patterns(&[r"^com::sun::star::uno::Sequence<.+>$"])?,
        uno::format_uno_sequence,
    );
    registry.register("uno-type", TypeMatcher::patterns(&[r"^com::sun::star::uno::Type$"])?, uno::format_uno_type);

    // Raw strings, ahead of the generic pointer formatter
    registry.register("c-string", TypeMatcher::exact(["char *", "char8_t *"]), strings::format_c_string);
    registry.register("u16-c-string", TypeMatcher::exact(["char16_t *"]), strings::format_u16_c_string);
    registry.register(
        "wide-c-string",
        TypeMatcher::exact(["wchar_t *", "char32_t *"]),
        strings::format_wide_c_string,
    );

    // Containers
    registry.register(
        "vector",
        TypeMatcher::patterns(&[r"^std::vector<.+>$", r"^std::__2::vector<.+>$"])?,
        containers::format_vector,
    );
    registry.register("pointer", TypeMatcher::predicate(|info| info.is_pointer()), containers::format_pointer_or_reference);
    registry.register("dynamic-array", TypeMatcher::patterns(&[r"^.+\[\]$"])?, containers::format_dynamic_array);

    // Wide integers and reference types
    registry.register("uint128", TypeMatcher::exact(["unsigned __int128"]), primitive::format_u128);
    registry.register("int128", TypeMatcher::exact(["__int128"]), primitive::format_i128);
    registry.register(
        "externref",
        TypeMatcher::exact(["__externref_t", "externref_t"]),
        primitive::format_extern_ref,
    );

    Ok(())
}
