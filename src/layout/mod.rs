// Struct layer: declaration, live views and snapshots

pub mod def;
pub mod error;
pub mod field;
pub mod options;
pub mod snapshot;
pub mod view;

pub use def::{StructBuilder, StructDef};
pub use error::{Result, StructError};
pub use field::{Field, FieldArg, FieldSpec};
pub use options::{FieldOptions, StructOptions};
pub use snapshot::Snapshot;
pub use view::View;
