// Owned byte buffer that views and snapshots can share

use std::cell::Cell;
use std::fmt;

/// Owned byte storage.
///
/// The bytes sit in cells so that any number of views may read and write
/// them through a shared `&MemoryMap`. It is not `Sync`; a map is used from
/// one thread at a time.
#[derive(Clone, PartialEq, Default)]
pub struct MemoryMap {
    data: Box<[Cell<u8>]>,
}

impl MemoryMap {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data: data.into_iter().map(Cell::new).collect(),
        }
    }

    /// Zero-filled map of `size` bytes
    pub fn new_with_size(size: usize) -> Self {
        Self::new(vec![0u8; size])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole buffer, for binding views or running snapshot reads/writes
    pub fn cells(&self) -> &[Cell<u8>] {
        &self.data
    }

    /// Copy the current contents out
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.iter().map(Cell::get).collect()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec().into_iter().map(Cell::into_inner).collect()
    }
}

impl From<&[u8]> for MemoryMap {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl fmt::Debug for MemoryMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemoryMap").field(&self.to_vec()).finish()
    }
}
