//! Fixed-size record pool for term entries.
//!
//! Entries are addressed by [`EntryId`] rather than by reference, which lets
//! the hash chains and the pending-update list link entries without borrowing
//! them. There is no per-entry free: the whole pool is cleared at once when a
//! batch ends, and the backing allocation is kept for the next batch.

use std::mem;

use super::entry::TermEntry;
use crate::error::{FalchionError, Result};

/// Handle of a [`TermEntry`] inside an [`EntryPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u32);

impl EntryId {
    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Pool of term entries with bulk reset.
#[derive(Debug, Default)]
pub struct EntryPool {
    entries: Vec<TermEntry>,
}

impl EntryPool {
    /// Creates a new empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool with room for `entries` records.
    pub fn with_capacity(entries: usize) -> Self {
        EntryPool {
            entries: Vec::with_capacity(entries),
        }
    }

    /// Store `entry` and return its handle.
    pub(crate) fn alloc(&mut self, entry: TermEntry) -> Result<EntryId> {
        let index = u32::try_from(self.entries.len())
            .map_err(|_| FalchionError::out_of_memory("entry pool exhausted"))?;
        self.entries.try_reserve(1).map_err(|e| {
            FalchionError::out_of_memory(format!("entry pool growth failed: {e}"))
        })?;
        self.entries.push(entry);
        Ok(EntryId(index))
    }

    #[inline]
    pub fn get(&self, id: EntryId) -> &TermEntry {
        &self.entries[id.index()]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: EntryId) -> &mut TermEntry {
        &mut self.entries[id.index()]
    }

    /// Iterate over every live entry with its handle.
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &TermEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (EntryId(i as u32), entry))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TermEntry> {
        self.entries.iter_mut()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes taken by the entry records themselves, excluding their buffers.
    pub fn memory_usage(&self) -> usize {
        self.entries.len() * mem::size_of::<TermEntry>()
    }

    /// Drop every entry (and its postings buffer), keeping the record storage.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
