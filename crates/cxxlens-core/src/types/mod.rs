//! # Types
//!
//! Addresses and the static type layouts values are interpreted through.

pub mod address;
pub mod layout;

// Re-export all public types
pub use address::Address;
pub use layout::{Member, TypeInfo, TypeKind, TypeNames, TypeTable};
