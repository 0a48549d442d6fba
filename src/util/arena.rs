//! Append-only arena for interned term text.
//!
//! Every distinct term of a batch is copied here once and referenced by a
//! small [`TermSpan`] instead of owning its own heap allocation. The arena has
//! no per-term free and no compaction: it is reset as a whole when the batch
//! is dumped or cleared.
//!
//! ```text
//! text:  [apple][banana][cherry]...[free space]
//!         ^      ^       ^
//! spans: (0,5)  (5,6)   (11,6)
//! ```

use crate::error::{FalchionError, Result};

/// Location of an interned term inside a [`TermArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermSpan {
    offset: u32,
    len: u32,
}

impl TermSpan {
    /// Byte offset in the arena.
    #[inline(always)]
    pub const fn offset(self) -> usize {
        self.offset as usize
    }

    /// Byte length of the term.
    #[inline(always)]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Whether the term is empty.
    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Bump allocator for term strings.
#[derive(Debug, Default)]
pub struct TermArena {
    text: String,
}

impl TermArena {
    /// Creates a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with `bytes` of text capacity reserved up front.
    pub fn with_capacity(bytes: usize) -> Self {
        TermArena {
            text: String::with_capacity(bytes),
        }
    }

    /// Copy `term` into the arena.
    pub fn intern(&mut self, term: &str) -> Result<TermSpan> {
        let offset = self.text.len();
        if offset + term.len() > u32::MAX as usize {
            return Err(FalchionError::out_of_memory("term arena exceeds 4 GiB"));
        }

        self.text.try_reserve(term.len()).map_err(|e| {
            FalchionError::out_of_memory(format!("term arena growth failed: {e}"))
        })?;
        self.text.push_str(term);

        Ok(TermSpan {
            offset: offset as u32,
            len: term.len() as u32,
        })
    }

    /// Resolve a span returned by [`intern`](Self::intern).
    #[inline]
    pub fn get(&self, span: TermSpan) -> &str {
        &self.text[span.offset()..span.offset() + span.len()]
    }

    /// Bytes of term text held.
    pub fn bytes_used(&self) -> usize {
        self.text.len()
    }

    /// Bytes reserved, used or not.
    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    /// Forget every interned term, keeping the allocation.
    pub fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut arena = TermArena::new();
        let apple = arena.intern("apple").unwrap();
        let cafe = arena.intern("café").unwrap();

        assert_eq!(arena.get(apple), "apple");
        assert_eq!(arena.get(cafe), "café");
        assert_eq!(cafe.offset(), 5);
        assert_eq!(cafe.len(), "café".len());
        assert_eq!(arena.bytes_used(), 5 + "café".len());
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut arena = TermArena::with_capacity(64);
        arena.intern("banana").unwrap();
        let capacity = arena.capacity();

        arena.clear();
        assert_eq!(arena.bytes_used(), 0);
        assert_eq!(arena.capacity(), capacity);

        let span = arena.intern("cherry").unwrap();
        assert_eq!(span.offset(), 0);
        assert_eq!(arena.get(span), "cherry");
    }
}
