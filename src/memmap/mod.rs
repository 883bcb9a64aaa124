// Byte storage shared by views and snapshots
pub mod memory_map;

pub use memory_map::MemoryMap;
