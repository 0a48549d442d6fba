//! Per-term postings accumulator.
//!
//! A [`TermEntry`] owns the encoded postings of one term. The buffer is a
//! concatenation of one group per document the term occurred in, in
//! increasing docno order:
//!
//! ```text
//! varint(docno_gap) varint(count) varint(position_gap){count}
//! ```
//!
//! The count precedes the positions it describes, but it is not known until
//! the document is finalized. The first occurrence in a document therefore
//! writes a count of 1 and remembers where it went; [`TermEntry::seal`]
//! rewrites it when the guess was wrong. Counts below 128 still fit in the
//! single byte that was reserved, so only terms occurring 128 or more times in
//! one document pay for moving their positions.

use super::pool::EntryId;
use crate::error::{FalchionError, Result};
use crate::util::arena::TermSpan;
use crate::util::varint::{self, MAX_VARINT_LEN};

/// Postings and bookkeeping for one term of the current batch.
#[derive(Debug)]
pub struct TermEntry {
    pub(crate) term: TermSpan,
    /// Encoded postings. `len()` is the write cursor.
    buffer: Vec<u8>,
    /// Docno of the last document this term was finalized in.
    last_docno: Option<u64>,
    /// Last position recorded for this term in the current document.
    last_offset: Option<u64>,
    /// Buffer index of the count written for the current document.
    last_count_pos: usize,
    /// Occurrences seen in the current, not yet finalized, document.
    pending_offsets: u32,
    total_docs: u64,
    total_occurrences: u64,
    /// Hash chain link.
    pub(crate) next: Option<EntryId>,
    /// Pending-update list link, only meaningful while `pending_offsets > 0`.
    pub(crate) update_next: Option<EntryId>,
}

impl TermEntry {
    /// Create an entry with an empty postings buffer of `initial_len` bytes.
    pub(crate) fn new(term: TermSpan, initial_len: usize, next: Option<EntryId>) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(initial_len).map_err(|e| {
            FalchionError::out_of_memory(format!("postings buffer allocation failed: {e}"))
        })?;

        Ok(TermEntry {
            term,
            buffer,
            last_docno: None,
            last_offset: None,
            last_count_pos: 0,
            pending_offsets: 0,
            total_docs: 0,
            total_occurrences: 0,
            next,
            update_next: None,
        })
    }

    /// Encoded postings accumulated so far.
    pub fn postings(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of finalized documents containing the term.
    pub fn doc_frequency(&self) -> u64 {
        self.total_docs
    }

    /// Number of finalized occurrences of the term.
    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    /// Docno of the last finalized document containing the term.
    pub fn last_docno(&self) -> Option<u64> {
        self.last_docno
    }

    /// Occurrences recorded in the current document.
    pub fn pending_offsets(&self) -> u32 {
        self.pending_offsets
    }

    /// Bytes reserved for the postings buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether `position` may follow the positions already recorded for the
    /// current document.
    pub(crate) fn accepts_position(&self, position: u64) -> bool {
        self.last_offset.is_none_or(|last| position > last)
    }

    /// Record one occurrence at `position` in document `docno`.
    ///
    /// Returns the number of postings bytes written. The caller must already
    /// have linked the entry into the pending-update list if this is its first
    /// occurrence in the document.
    pub(crate) fn record(&mut self, docno: u64, position: u64) -> Result<usize> {
        let mut written = 0;

        if self.pending_offsets == 0 {
            let gap = docno - self.last_docno.map_or(0, |d| d + 1);
            written += self.push_varint(gap)?;

            self.last_count_pos = self.buffer.len();
            written += self.push_varint(1)?;
        }

        let gap = position - self.last_offset.map_or(0, |p| p + 1);
        written += self.push_varint(gap)?;

        self.last_offset = Some(position);
        self.pending_offsets += 1;
        Ok(written)
    }

    /// Close the current document: correct the provisional count and reset
    /// the per-document state.
    ///
    /// Returns the number of bytes the count field grew by.
    pub(crate) fn seal(&mut self, docno: u64) -> Result<usize> {
        let count = self.pending_offsets as u64;
        let mut widened = 0;

        if count > 1 {
            let len = varint::encoded_len(count);
            if len > 1 {
                widened = len - 1;
                self.ensure_spare(widened)?;

                let end = self.buffer.len();
                let from = self.last_count_pos + 1;
                // Capacity was reserved above, so this cannot reallocate.
                self.buffer.resize(end + widened, 0);
                self.buffer.copy_within(from..end, from + widened);
                log::trace!("count field widened to {len} bytes for {count} occurrences");
            }

            let written = varint::encode_into(count, &mut self.buffer[self.last_count_pos..]);
            debug_assert_eq!(written, len);
        }

        self.total_occurrences += count;
        self.total_docs += 1;
        self.pending_offsets = 0;
        self.last_docno = Some(docno);
        self.last_offset = None;
        self.last_count_pos = self.buffer.len();
        self.update_next = None;

        Ok(widened)
    }

    /// Rewrite the buffer keeping only `(docno_gap, count)` of every group.
    ///
    /// The write cursor always trails the read cursor, so the rewrite happens
    /// in place. Returns the number of bytes removed.
    pub(crate) fn strip_offsets(&mut self) -> Result<usize> {
        let end = self.buffer.len();
        let mut read = 0;
        let mut write = 0;

        while read < end {
            let (gap, n) = varint::decode(&self.buffer[read..end])
                .ok_or_else(|| FalchionError::corrupt("truncated docno gap"))?;
            read += n;
            let (count, n) = varint::decode(&self.buffer[read..end])
                .ok_or_else(|| FalchionError::corrupt("truncated occurrence count"))?;
            read += n;
            let skipped = usize::try_from(count)
                .ok()
                .and_then(|count| varint::skip_n(&self.buffer[read..end], count))
                .ok_or_else(|| FalchionError::corrupt("truncated positions"))?;
            read += skipped;

            write += varint::encode_into(gap, &mut self.buffer[write..]);
            write += varint::encode_into(count, &mut self.buffer[write..]);
        }

        self.buffer.truncate(write);
        self.last_count_pos = write;
        Ok(end - write)
    }

    /// Append one varint, growing the buffer as needed.
    fn push_varint(&mut self, value: u64) -> Result<usize> {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let len = varint::encode_into(value, &mut scratch);
        self.ensure_spare(len)?;
        self.buffer.extend_from_slice(&scratch[..len]);
        Ok(len)
    }

    /// Double the capacity until at least `needed` bytes are free.
    ///
    /// Positions into the buffer are plain indices, so they stay valid across
    /// the reallocation.
    fn ensure_spare(&mut self, needed: usize) -> Result<()> {
        while self.buffer.capacity() - self.buffer.len() < needed {
            let target = (self.buffer.capacity() * 2).max(MAX_VARINT_LEN);
            self.buffer
                .try_reserve_exact(target - self.buffer.len())
                .map_err(|e| {
                    FalchionError::out_of_memory(format!(
                        "postings buffer growth to {target} bytes failed: {e}"
                    ))
                })?;
        }
        Ok(())
    }
}
