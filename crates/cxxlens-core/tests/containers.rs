//! Tests for vectors, pointers and dynamic arrays

mod common;

use cxxlens_core::memory::LinearMemory;
use cxxlens_core::types::Address;
use cxxlens_core::{FormatterEngine, FormatterResult, Limits};

const VECTOR: &str = "std::__2::vector<int32_t, std::__2::allocator<int32_t> >";

fn vector_memory(begin: u32, items: &[i32]) -> LinearMemory
{
    let mut memory = LinearMemory::new(0x2000);
    let end = begin + 4 * items.len() as u32;
    memory.write_u32(Address::new(0x100), begin).unwrap();
    memory.write_u32(Address::new(0x104), end).unwrap();
    memory.write_u32(Address::new(0x108), end).unwrap();
    for (index, item) in items.iter().enumerate() {
        memory.write(Address::new(begin + 4 * index as u32), &item.to_le_bytes()).unwrap();
    }
    memory
}

#[test]
fn test_vector_elements()
{
    let memory = vector_memory(0x1000, &[10, -20, 30]);
    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x100, VECTOR);

    let Some(FormatterResult::Array(elements)) = engine.format(value) else {
        panic!("expected an array");
    };
    let locations: Vec<u32> = elements.iter().map(|element| element.location().value()).collect();
    assert_eq!(locations, vec![0x1000, 0x1004, 0x1008]);

    let formatted: Vec<_> = elements.into_iter().map(|element| engine.format(element)).collect();
    assert_eq!(
        formatted,
        vec![
            Some(FormatterResult::Int(10)),
            Some(FormatterResult::Int(-20)),
            Some(FormatterResult::Int(30)),
        ]
    );
}

#[test]
fn test_empty_vector()
{
    let memory = LinearMemory::new(0x200);
    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x100, VECTOR);
    assert_eq!(engine.format(value), Some(FormatterResult::Array(Vec::new())));
}

#[test]
fn test_vector_with_end_before_begin_is_empty()
{
    let mut memory = LinearMemory::new(0x200);
    memory.write_u32(Address::new(0x100), 0x1010).unwrap();
    memory.write_u32(Address::new(0x104), 0x1000).unwrap();

    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x100, VECTOR);
    assert_eq!(engine.format(value), Some(FormatterResult::Array(Vec::new())));
}

#[test]
fn test_vector_is_capped()
{
    let memory = vector_memory(0x1000, &[1, 2, 3, 4, 5]);
    let types = common::types();
    let engine = FormatterEngine::with_limits(Limits::default().with_max_elements(2)).unwrap();
    let value = common::value(&memory, &types, 0x100, VECTOR);

    let Some(FormatterResult::Array(elements)) = engine.format(value) else {
        panic!("expected an array");
    };
    assert_eq!(elements.len(), 2);
}

#[test]
fn test_null_pointer()
{
    let memory = LinearMemory::new(0x100);
    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x40, "int32_t *");

    let Some(FormatterResult::Map(map)) = engine.format(value) else {
        panic!("expected a pointer box");
    };
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("0x0"), Some(&None));
}

#[test]
fn test_pointer_box_uses_lowercase_hex()
{
    let mut memory = LinearMemory::new(0x2000);
    memory.write_u32(Address::new(0x40), 0x1abc).unwrap();
    memory.write(Address::new(0x1abc), &42i32.to_le_bytes()).unwrap();

    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x40, "int32_t *");

    let Some(FormatterResult::Map(map)) = engine.format(value) else {
        panic!("expected a pointer box");
    };
    assert_eq!(map.labels().collect::<Vec<_>>(), vec!["0x1abc"]);
    let target = map.get("0x1abc").copied().flatten().unwrap();
    assert_eq!(target.location(), Address::new(0x1abc));
    assert_eq!(engine.format(target), Some(FormatterResult::Int(42)));
}

#[test]
fn test_dynamic_array()
{
    let mut memory = LinearMemory::new(0x1000);
    memory.write(Address::new(0x500), &7i32.to_le_bytes()).unwrap();

    let types = common::types();
    let engine = FormatterEngine::new().unwrap();
    let value = common::value(&memory, &types, 0x500, "int32_t[]");

    let Some(FormatterResult::Map(map)) = engine.format(value) else {
        panic!("expected a pointer box");
    };
    let first = map.get("0x500").copied().flatten().unwrap();
    assert_eq!(first.location(), Address::new(0x500));
    assert_eq!(engine.format(first), Some(FormatterResult::Int(7)));
}
