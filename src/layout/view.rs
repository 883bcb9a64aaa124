// Live views binding a struct definition to one buffer

use super::def::StructDef;
use super::error::{Result, StructError};
use super::field::Field;
use super::snapshot::Snapshot;
use crate::bitwise::{Int64Mode, Value};
use crate::memmap::MemoryMap;
use std::cell::Cell;

/// A struct layout bound to a caller-owned buffer.
///
/// Reads and writes go straight to the buffer at each field's offset. Views
/// hold shared references, so several may bind the same buffer and observe
/// each other's writes immediately.
#[derive(Debug, Clone, Copy)]
pub struct View<'d, 'b> {
    def: &'d StructDef,
    buf: &'b [Cell<u8>],
    no_assert: bool,
}

impl StructDef {
    /// Bind this layout to `buf`
    pub fn wrap<'d, 'b>(&'d self, buf: &'b [Cell<u8>]) -> View<'d, 'b> {
        tracing::trace!(
            "Binding {}-byte struct to {}-byte buffer",
            self.size(),
            buf.len()
        );
        View {
            def: self,
            buf,
            no_assert: self.no_assert(),
        }
    }
}

impl<'d, 'b> View<'d, 'b> {
    /// Override the struct's bounds-check default for this view
    pub fn no_assert(mut self, no_assert: bool) -> Self {
        self.no_assert = no_assert;
        self
    }

    pub fn def(&self) -> &'d StructDef {
        self.def
    }

    pub fn buffer(&self) -> &'b [Cell<u8>] {
        self.buf
    }

    fn read_field(&self, field: &Field) -> Result<Value<'b>> {
        field
            .read(self.buf, 0, self.def.access(field, self.no_assert))?
            .ok_or_else(|| StructError::Unreadable(field.name().to_string()))
    }

    /// Decode the named field from the bound buffer
    pub fn get(&self, name: &str) -> Result<Value<'b>> {
        self.read_field(self.def.lookup(name)?)
    }

    /// Decode the field at declaration position `index`
    pub fn get_at(&self, index: usize) -> Result<Value<'b>> {
        let field = self
            .def
            .fields()
            .get(index)
            .ok_or_else(|| StructError::UnknownField(index.to_string()))?;
        self.read_field(field)
    }

    /// Encode `value` into the named field of the bound buffer
    pub fn set<'v>(&self, name: &str, value: impl Into<Value<'v>>) -> Result<()> {
        let field = self.def.lookup(name)?;
        field.write(self.buf, 0, &value.into(), self.no_assert)?;
        Ok(())
    }

    /// Decode every readable field into a detached snapshot
    pub fn values(&self) -> Result<Snapshot<'b>> {
        self.def.read(self.buf, 0, Some(self.no_assert))
    }

    /// Write each field's configured default into the buffer
    pub fn write_values(&self) -> Result<&Self> {
        for field in self.def.fields() {
            if let Some(default) = field.default_value() {
                field.write(self.buf, 0, default, self.no_assert)?;
            }
        }
        Ok(self)
    }

    /// Fail on the first field whose value differs from its configured default.
    ///
    /// The default is compared as it decodes after being encoded, so a float32
    /// default is compared at float32 precision. Skipped 64-bit fields are
    /// compared byte for byte.
    pub fn check_values(&self) -> Result<&Self> {
        for field in self.def.fields() {
            let Some(default) = field.default_value() else {
                continue;
            };
            let mut access = self.def.access(field, self.no_assert);
            if access.int64_mode == Int64Mode::Skip {
                access.int64_mode = Int64Mode::Copy;
            }

            let actual = field.read(self.buf, 0, access)?;
            // The scratch buffer holds this one field, so bypass the struct offset
            let scratch = MemoryMap::new_with_size(field.size());
            (field.codec.write)(scratch.cells(), 0, default, false)?;
            let expected = (field.codec.read)(scratch.cells(), 0, access)?;

            if actual != expected {
                return Err(StructError::ValueMismatch {
                    field: field.name().to_string(),
                    expected: describe(expected.as_ref()),
                    actual: describe(actual.as_ref()),
                });
            }
        }
        Ok(self)
    }
}

fn describe(value: Option<&Value<'_>>) -> String {
    value.map_or_else(|| "nothing".to_string(), |v| v.to_string())
}
