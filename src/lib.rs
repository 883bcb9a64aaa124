// BINSTRUCT-RS: Binary struct definitions with typed field access
// Copyright 2024 - Licensed under GPLv3

pub mod bitwise;
pub mod layout;
pub mod memmap;

// Re-export commonly used types
pub use bitwise::int64::{global_mode as global_int64_mode, set_global_mode as set_global_int64_mode};
pub use bitwise::{cells, ElementError, Endianness, FieldType, Int64Mode, Value};
pub use layout::{
    Field, FieldArg, FieldOptions, FieldSpec, Snapshot, StructBuilder, StructDef, StructError,
    StructOptions, View,
};
pub use memmap::MemoryMap;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
