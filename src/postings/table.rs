//! Term hash table with move-to-front chaining.
//!
//! Term frequencies in text are heavily skewed, so every successful lookup
//! moves the found entry to the head of its bucket chain. Frequent terms end
//! up one comparison away without any explicit frequency tracking.
//!
//! The table has a fixed power-of-two number of buckets chosen at
//! construction and never rehashes; entries are only ever discarded together
//! with the whole batch.

use ahash::RandomState;

use super::entry::TermEntry;
use super::pool::{EntryId, EntryPool};
use crate::error::{FalchionError, Result};
use crate::util::arena::TermArena;

/// Fixed seeds so that bucket layout is reproducible between runs.
const HASH_SEEDS: [u64; 4] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
];

/// Outcome of [`TermTable::find_or_create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(EntryId),
    Created(EntryId),
}

impl Lookup {
    pub fn id(self) -> EntryId {
        match self {
            Lookup::Found(id) | Lookup::Created(id) => id,
        }
    }
}

/// Open hash table of bucket heads into an [`EntryPool`].
#[derive(Debug)]
pub struct TermTable {
    buckets: Vec<Option<EntryId>>,
    mask: usize,
    hasher: RandomState,
}

impl TermTable {
    /// Create a table with `1 << bits` buckets.
    pub fn new(bits: u32) -> Result<Self> {
        let size = 1usize.checked_shl(bits).ok_or_else(|| {
            FalchionError::invalid_argument(format!("table bits {bits} too large"))
        })?;

        let mut buckets = Vec::new();
        buckets.try_reserve_exact(size).map_err(|e| {
            FalchionError::out_of_memory(format!("hash table of {size} buckets: {e}"))
        })?;
        buckets.resize(size, None);

        Ok(TermTable {
            buckets,
            mask: size - 1,
            hasher: RandomState::with_seeds(
                HASH_SEEDS[0],
                HASH_SEEDS[1],
                HASH_SEEDS[2],
                HASH_SEEDS[3],
            ),
        })
    }

    /// Number of buckets.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket(&self, term: &str) -> usize {
        (self.hasher.hash_one(term) as usize) & self.mask
    }

    /// Find the entry for `term`, or create one with an empty postings
    /// buffer of `initial_len` bytes. A found entry is moved to the head of
    /// its chain.
    pub fn find_or_create(
        &mut self,
        term: &str,
        pool: &mut EntryPool,
        arena: &mut TermArena,
        initial_len: usize,
    ) -> Result<Lookup> {
        let bucket = self.bucket(term);
        let mut prev: Option<EntryId> = None;
        let mut cur = self.buckets[bucket];

        while let Some(id) = cur {
            let entry = pool.get(id);
            let next = entry.next;

            if arena.get(entry.term) == term {
                if let Some(prev) = prev {
                    pool.get_mut(prev).next = next;
                    pool.get_mut(id).next = self.buckets[bucket];
                    self.buckets[bucket] = Some(id);
                }
                return Ok(Lookup::Found(id));
            }

            prev = cur;
            cur = next;
        }

        let span = arena.intern(term)?;
        let entry = TermEntry::new(span, initial_len, self.buckets[bucket])?;
        let id = pool.alloc(entry)?;
        self.buckets[bucket] = Some(id);
        Ok(Lookup::Created(id))
    }

    /// Find the entry for `term` without reordering its chain.
    pub fn find(&self, term: &str, pool: &EntryPool, arena: &TermArena) -> Option<EntryId> {
        let mut cur = self.buckets[self.bucket(term)];
        while let Some(id) = cur {
            let entry = pool.get(id);
            if arena.get(entry.term) == term {
                return Some(id);
            }
            cur = entry.next;
        }
        None
    }

    /// Empty every bucket, keeping the bucket array.
    pub fn clear(&mut self) {
        self.buckets.fill(None);
    }

    /// Bytes taken by the bucket array.
    pub fn memory_usage(&self) -> usize {
        self.buckets.len() * std::mem::size_of::<Option<EntryId>>()
    }

    #[cfg(test)]
    fn chain(&self, term: &str, pool: &EntryPool) -> Vec<EntryId> {
        let mut ids = Vec::new();
        let mut cur = self.buckets[self.bucket(term)];
        while let Some(id) = cur {
            ids.push(id);
            cur = pool.get(id).next;
        }
        ids
    }
}
