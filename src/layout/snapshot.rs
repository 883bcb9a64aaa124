// Snapshots: one-shot decode into a name -> value mapping, and encode back

use super::def::StructDef;
use super::error::Result;
use crate::bitwise::{ElementError, Value};
use crate::memmap::MemoryMap;
use indexmap::IndexMap;
use serde::Serialize;
use std::cell::Cell;

/// Decoded field values keyed by field name, in declaration order.
///
/// A snapshot is detached from the buffer it came from, except for
/// slice-mode 64-bit values which alias their source bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot<'a> {
    values: IndexMap<String, Value<'a>>,
}

impl<'a> Snapshot<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value<'a>> {
        self.values.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value<'a>> {
        self.values.get_mut(name)
    }

    /// Set a value, returning the one it replaces
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value<'a>>) -> Option<Value<'a>> {
        self.values.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value<'a>> {
        self.values.shift_remove(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value<'a>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy out any aliased slices so the snapshot no longer borrows a buffer
    pub fn into_owned(self) -> Snapshot<'static> {
        Snapshot {
            values: self
                .values
                .into_iter()
                .map(|(k, v)| (k, v.into_owned()))
                .collect(),
        }
    }

    /// Infinite floats serialize as `null`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl<'a, K: Into<String>, V: Into<Value<'a>>> FromIterator<(K, V)> for Snapshot<'a> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Snapshot {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = (String, Value<'a>);
    type IntoIter = indexmap::map::IntoIter<String, Value<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl StructDef {
    /// Decode every readable field of the struct starting at `offset`.
    ///
    /// `no_assert` overrides the struct's bounds-check default. Skipped
    /// 64-bit fields are left out of the result.
    pub fn read<'a>(
        &self,
        buf: &'a [Cell<u8>],
        offset: usize,
        no_assert: Option<bool>,
    ) -> Result<Snapshot<'a>> {
        let no_assert = no_assert.unwrap_or(self.no_assert());
        let mut snapshot = Snapshot::new();
        for field in self.fields() {
            if let Some(value) = field.read(buf, offset, self.access(field, no_assert))? {
                snapshot.values.insert(field.name().to_string(), value);
            }
        }
        Ok(snapshot)
    }

    /// Decode from a plain byte slice. Slice-mode values come back as copies,
    /// since an immutable slice cannot be aliased for writing.
    pub fn unpack(&self, bytes: &[u8], offset: usize) -> Result<Snapshot<'static>> {
        let mmap = MemoryMap::from(bytes);
        Ok(self.read(mmap.cells(), offset, None)?.into_owned())
    }

    /// Encode into `buf` at `offset`.
    ///
    /// Each field takes its value from `data`, else its configured default,
    /// else zero. Fields already written stay written if a later one fails.
    pub fn write(
        &self,
        data: Option<&Snapshot<'_>>,
        buf: &[Cell<u8>],
        offset: usize,
        no_assert: Option<bool>,
    ) -> Result<()> {
        let no_assert = no_assert.unwrap_or(self.no_assert());
        let zero = Value::UInt(0);
        for field in self.fields() {
            let value = data
                .and_then(|d| d.get(field.name()))
                .or(field.default_value())
                .unwrap_or(&zero);
            field.write(buf, offset, value, no_assert)?;
        }
        Ok(())
    }

    /// Encode into a freshly allocated buffer of `size + offset` bytes.
    /// The leading `offset` bytes are zero.
    pub fn pack(&self, data: Option<&Snapshot<'_>>, offset: usize) -> Result<Vec<u8>> {
        let len = self
            .size()
            .checked_add(offset)
            .ok_or(ElementError::BoundsViolation {
                offset,
                size: self.size(),
                len: usize::MAX,
            })?;
        let mmap = MemoryMap::new_with_size(len);
        self.write(data, mmap.cells(), offset, None)?;
        Ok(mmap.into_vec())
    }
}
