// Primitive field layer: types, bounded element access, codecs, int64 policy

pub mod codec;
pub mod elements;
pub mod int64;
pub mod types;

pub use codec::{lookup, Access, Codec, ReadFn, WriteFn};
pub use elements::ElementError;
pub use int64::{global_mode, set_global_mode, Int64Mode};
pub use types::{cells, Endianness, FieldType, Value};
