//! # Tree Rendering
//!
//! Prints a formatted value as an indented tree, expanding the children a
//! formatter hands back until the depth limit is reached. Values without a
//! formatter are shown by their raw layout.

use cxxlens_core::types::TypeKind;
use cxxlens_core::{FormatterEngine, FormatterResult, Value};

const INDENT: &str = "  ";

/// Renders values through a [`FormatterEngine`]
pub struct Renderer<'e>
{
    engine: &'e FormatterEngine,
    max_depth: usize,
}

impl<'e> Renderer<'e>
{
    pub fn new(engine: &'e FormatterEngine, max_depth: usize) -> Self
    {
        Self { engine, max_depth }
    }

    /// Render `value` under `label`, one line per node.
    pub fn render(&self, label: &str, value: Value<'_>) -> Vec<String>
    {
        let mut lines = Vec::new();
        self.value(&mut lines, label, value, 0, 0);
        lines
    }

    fn value(&self, lines: &mut Vec<String>, label: &str, value: Value<'_>, indent: usize, depth: usize)
    {
        match self.engine.format(value) {
            Some(result) => self.result(lines, label, value, result, indent, depth),
            None => self.raw(lines, label, value, indent, depth),
        }
    }

    fn result(&self, lines: &mut Vec<String>, label: &str, value: Value<'_>, result: FormatterResult<'_>, indent: usize, depth: usize)
    {
        let type_name = value.type_info().primary_name();
        match result {
            FormatterResult::Bool(flag) => push(lines, indent, label, &flag.to_string()),
            FormatterResult::Int(number) => push(lines, indent, label, &number.to_string()),
            FormatterResult::UInt(number) => push(lines, indent, label, &number.to_string()),
            FormatterResult::Float(number) => push(lines, indent, label, &number.to_string()),
            FormatterResult::Int128(number) => push(lines, indent, label, &number.to_string()),
            FormatterResult::UInt128(number) => push(lines, indent, label, &number.to_string()),
            FormatterResult::Text(text) => push(lines, indent, label, &format!("{text:?}")),
            FormatterResult::SizedText { size, text } => push(lines, indent, label, &format!("{text:?} (size {size})")),
            FormatterResult::Void => push(lines, indent, label, "<void>"),
            FormatterResult::Empty => push(lines, indent, label, "<unavailable>"),
            FormatterResult::ExternRef(handle) => push(lines, indent, label, &handle.to_string()),
            FormatterResult::Child(child) if child == value => self.raw(lines, label, value, indent, depth),
            FormatterResult::Child(child) => {
                if depth >= self.max_depth {
                    push(lines, indent, label, &format!("{type_name} ..."));
                } else {
                    self.value(lines, label, child, indent, depth + 1);
                }
            }
            FormatterResult::Map(children) => {
                if depth >= self.max_depth {
                    push(lines, indent, label, &format!("{type_name} {{...}}"));
                    return;
                }
                push(lines, indent, label, type_name);
                for (entry, child) in children.iter() {
                    match child {
                        Some(child) => self.value(lines, entry, child, indent + 1, depth + 1),
                        None => push(lines, indent + 1, entry, "null"),
                    }
                }
            }
            FormatterResult::Array(elements) => {
                let summary = format!("{type_name} [{} elements]", elements.len());
                if depth >= self.max_depth {
                    push(lines, indent, label, &format!("{summary} ..."));
                    return;
                }
                push(lines, indent, label, &summary);
                for (index, element) in elements.into_iter().enumerate() {
                    self.value(lines, &format!("[{index}]"), element, indent + 1, depth + 1);
                }
            }
        }
    }

    fn raw(&self, lines: &mut Vec<String>, label: &str, value: Value<'_>, indent: usize, depth: usize)
    {
        let info = value.type_info();
        let type_name = info.primary_name();
        match &info.kind {
            TypeKind::Struct { members } => {
                if depth >= self.max_depth {
                    push(lines, indent, label, &format!("{type_name} {{...}}"));
                    return;
                }
                push(lines, indent, label, type_name);
                for member in members {
                    match value.field(&member.name) {
                        Some(field) => self.value(lines, &member.name, field, indent + 1, depth + 1),
                        None => push(lines, indent + 1, &member.name, &format!("<unknown type {}>", member.type_name)),
                    }
                }
            }
            TypeKind::Array { count: Some(count), .. } if depth < self.max_depth => {
                push(lines, indent, label, type_name);
                for index in 0..*count {
                    match value.element(index) {
                        Ok(Some(element)) => self.value(lines, &format!("[{index}]"), element, indent + 1, depth + 1),
                        Ok(None) => break,
                        Err(_) => push(lines, indent + 1, &format!("[{index}]"), "<unavailable>"),
                    }
                }
            }
            TypeKind::Pointer { .. } => match value.as_u32() {
                Ok(address) => push(lines, indent, label, &format!("({type_name}) 0x{address:x}")),
                Err(_) => push(lines, indent, label, "<unavailable>"),
            },
            TypeKind::Scalar if info.size > 0 => match value.as_data() {
                Ok(bytes) => push(lines, indent, label, &format!("({type_name}) 0x{}", little_endian_hex(&bytes))),
                Err(_) => push(lines, indent, label, "<unavailable>"),
            },
            _ => push(lines, indent, label, type_name),
        }
    }
}

fn push(lines: &mut Vec<String>, indent: usize, label: &str, text: &str)
{
    lines.push(format!("{}{label}: {text}", INDENT.repeat(indent)));
}

/// Bytes of a little-endian scalar, most significant first.
fn little_endian_hex(bytes: &[u8]) -> String
{
    bytes.iter().rev().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests
{
    use cxxlens_core::memory::LinearMemory;
    use cxxlens_core::types::{Address, Member, TypeInfo, TypeTable};

    use super::*;

    fn types() -> TypeTable
    {
        let mut types = TypeTable::new();
        types.insert(TypeInfo::scalar("char", 1));
        types.insert(TypeInfo::scalar("uint32_t", 4));
        types.insert(TypeInfo::scalar("int32_t", 4));
        types.insert(TypeInfo::scalar("Opaque", 2));
        types.insert(TypeInfo::pointer("char *", "char"));
        types.insert(TypeInfo::pointer("int32_t *", "int32_t"));
        types.insert(TypeInfo::structure(
            "Point",
            8,
            vec![Member::new("X", "int32_t", 0), Member::new("Y", "int32_t", 4)],
        ));
        types.insert(TypeInfo::array("Point[2]", "Point", Some(2), 16));
        types
    }

    fn memory() -> LinearMemory
    {
        let mut memory = LinearMemory::new(0x2000);
        memory.write_u32(Address::new(0x10), 42).unwrap();
        memory.write_u32(Address::new(0x20), 0x30).unwrap();
        memory.write_u32(Address::new(0x30), 7).unwrap();
        memory.write_u32(Address::new(0x40), 3).unwrap();
        memory.write_u32(Address::new(0x44), 0xffff_fffc).unwrap();
        memory.write_u16(Address::new(0x50), 0xbeef).unwrap();
        memory.write_u32(Address::new(0x60), 0x800).unwrap();
        memory.write(Address::new(0x800), b"hi\0").unwrap();
        memory
    }

    fn render(type_name: &str, address: u32, depth: usize) -> Vec<String>
    {
        let memory = memory();
        let types = types();
        let engine = FormatterEngine::new().unwrap();
        let value = Value::of_type(&memory, &types, Address::new(address), type_name).unwrap();
        Renderer::new(&engine, depth).render("value", value)
    }

    #[test]
    fn test_render_scalar()
    {
        assert_eq!(render("uint32_t", 0x10, 4), vec!["value: 42"]);
    }

    #[test]
    fn test_render_string()
    {
        assert_eq!(render("char *", 0x60, 4), vec!["value: \"hi\""]);
    }

    #[test]
    fn test_render_pointer_box()
    {
        assert_eq!(render("int32_t *", 0x20, 4), vec!["value: int32_t *", "  0x30: 7"]);
    }

    #[test]
    fn test_render_raw_struct()
    {
        assert_eq!(render("Point", 0x40, 4), vec!["value: Point", "  X: 3", "  Y: -4"]);
    }

    #[test]
    fn test_render_raw_array()
    {
        assert_eq!(
            render("Point[2]", 0x40, 4),
            vec![
                "value: Point[2]",
                "  [0]: Point",
                "    X: 3",
                "    Y: -4",
                "  [1]: Point",
                "    X: 0",
                "    Y: 0",
            ]
        );
    }

    #[test]
    fn test_render_raw_scalar()
    {
        assert_eq!(render("Opaque", 0x50, 4), vec!["value: (Opaque) 0xbeef"]);
    }

    #[test]
    fn test_render_depth_limit()
    {
        assert_eq!(render("int32_t *", 0x20, 0), vec!["value: int32_t * {...}"]);
        assert_eq!(render("Point", 0x40, 0), vec!["value: Point {...}"]);
    }

    #[test]
    fn test_render_fault_is_unavailable()
    {
        assert_eq!(render("uint32_t", 0x1ffe, 4), vec!["value: <unavailable>"]);
    }

    #[test]
    fn test_little_endian_hex()
    {
        assert_eq!(little_endian_hex(&[0x01, 0x02, 0x0a]), "0a0201");
        assert_eq!(little_endian_hex(&[]), "");
    }
}
