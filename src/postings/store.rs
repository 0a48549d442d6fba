//! The postings store: per-document accumulation of term postings.
//!
//! A store is driven through a strict call sequence:
//!
//! ```text
//! (begin_document  add_word*  finalize_document)*  dump
//! ```
//!
//! Words must arrive in increasing position order within a document and
//! documents in increasing docno order. `finalize_document` fixes up the
//! provisional occurrence counts written while the document was open and
//! reports the document's statistics. `dump` writes every term's postings in
//! term order and leaves the store empty for the next batch.
//!
//! # Examples
//!
//! ```
//! use falchion::postings::{PostingsConfig, PostingsStore};
//!
//! let mut store = PostingsStore::new(PostingsConfig::with_table_size(1024)).unwrap();
//!
//! store.begin_document(0).unwrap();
//! store.add_word("quick", 0).unwrap();
//! store.add_word("fox", 1).unwrap();
//! let stats = store.finalize_document().unwrap();
//! assert_eq!(stats.distinct, 2);
//!
//! let mut out = Vec::new();
//! store.dump(&mut out).unwrap();
//! assert_eq!(store.distinct_terms(), 0);
//! ```

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

use super::config::{MAX_TERM_LEN, PostingsConfig};
use super::entry::TermEntry;
use super::pool::{EntryId, EntryPool};
use super::table::TermTable;
use crate::analysis::stemmer::Stemmer;
use crate::analysis::stop::StopPredicate;
use crate::error::{ErrorKind, FalchionError, Result};
use crate::util::arena::TermArena;

/// Statistics of one finalized document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DocStats {
    /// Cosine length of the document: `sqrt(sum((1 + ln f_dt)^2))`.
    pub weight: f64,
    /// Number of term occurrences in the document.
    pub terms: u64,
    /// Number of distinct terms in the document.
    pub distinct: u64,
}

/// Per-term summary returned by [`PostingsStore::term_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermInfo {
    pub doc_frequency: u64,
    pub total_occurrences: u64,
    pub last_docno: Option<u64>,
    pub postings_len: usize,
}

/// Builder for a [`PostingsStore`] with optional term transforms and
/// caller supplied allocators.
pub struct PostingsStoreBuilder {
    config: PostingsConfig,
    stemmer: Option<Box<dyn Stemmer>>,
    stop: Option<Box<dyn StopPredicate>>,
    pool: Option<EntryPool>,
    arena: Option<TermArena>,
}

impl PostingsStoreBuilder {
    /// Stem every inserted term with `stemmer`.
    pub fn stemmer(mut self, stemmer: Box<dyn Stemmer>) -> Self {
        self.stemmer = Some(stemmer);
        self
    }

    /// Drop terms matching `stop` when dumping.
    pub fn stop_words<S: StopPredicate + 'static>(mut self, stop: S) -> Self {
        self.stop = Some(Box::new(stop));
        self
    }

    /// Back the store with the given entry pool and term arena. Both are
    /// cleared before use.
    pub fn allocators(mut self, pool: EntryPool, arena: TermArena) -> Self {
        self.pool = Some(pool);
        self.arena = Some(arena);
        self
    }

    /// Validate the configuration and allocate the table.
    pub fn build(self) -> Result<PostingsStore> {
        self.config.validate()?;
        let table = TermTable::new(self.config.table_bits())?;

        let mut pool = self.pool.unwrap_or_default();
        let mut arena = self.arena.unwrap_or_default();
        pool.clear();
        arena.clear();

        Ok(PostingsStore {
            config: self.config,
            table,
            pool,
            arena,
            stemmer: self.stemmer,
            stop: self.stop,
            current_docno: None,
            pending: None,
            update_required: false,
            total_occurrences: 0,
            documents: 0,
            postings_bytes: 0,
            last_error: None,
            failed: false,
            stripped: false,
            scratch: String::with_capacity(64),
        })
    }
}

/// In-memory accumulator of compressed postings for one batch of documents.
pub struct PostingsStore {
    pub(crate) config: PostingsConfig,
    pub(crate) table: TermTable,
    pub(crate) pool: EntryPool,
    pub(crate) arena: TermArena,
    stemmer: Option<Box<dyn Stemmer>>,
    pub(crate) stop: Option<Box<dyn StopPredicate>>,
    /// Docno of the document being (or last) built; `None` before the first.
    current_docno: Option<u64>,
    /// Head of the pending-update list.
    pending: Option<EntryId>,
    /// Set from `begin_document` until `finalize_document`, even for
    /// documents without terms.
    update_required: bool,
    total_occurrences: u64,
    documents: u64,
    /// Bytes of encoded postings across all entries.
    pub(crate) postings_bytes: usize,
    pub(crate) last_error: Option<ErrorKind>,
    /// Set by an allocation failure mid-document; only `clear` or `abort`
    /// are valid afterwards.
    pub(crate) failed: bool,
    stripped: bool,
    /// Reused buffer for stemming.
    scratch: String,
}

impl fmt::Debug for PostingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostingsStore")
            .field("table_size", &self.table.size())
            .field("distinct_terms", &self.pool.len())
            .field("total_occurrences", &self.total_occurrences)
            .field("documents", &self.documents)
            .field("current_docno", &self.current_docno)
            .field("update_required", &self.update_required)
            .field("stemmer", &self.stemmer.as_ref().map(|s| s.name()))
            .field("stop", &self.stop.is_some())
            .field("failed", &self.failed)
            .finish()
    }
}

impl PostingsStore {
    /// Create a store with no stemming or stopping.
    pub fn new(config: PostingsConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a store.
    pub fn builder(config: PostingsConfig) -> PostingsStoreBuilder {
        PostingsStoreBuilder {
            config,
            stemmer: None,
            stop: None,
            pool: None,
            arena: None,
        }
    }

    /// Start a new document. `docno` must be greater than the previous
    /// document's; the first document of a batch may use any docno,
    /// including 0.
    pub fn begin_document(&mut self, docno: u64) -> Result<()> {
        self.check_usable()?;
        if self.update_required {
            return Err(FalchionError::protocol_violation(format!(
                "document {} was not finalized before document {docno}",
                self.current_docno.unwrap_or_default()
            )));
        }
        if let Some(current) = self.current_docno
            && docno <= current
        {
            return Err(FalchionError::protocol_violation(format!(
                "docno {docno} does not follow {current}"
            )));
        }

        self.current_docno = Some(docno);
        self.documents += 1;
        self.update_required = true;
        Ok(())
    }

    /// Record an occurrence of `term` at word `position` of the current
    /// document.
    ///
    /// The configured stemmer runs first; a term that stems to nothing (or
    /// an empty term) is ignored. Positions of one term must strictly
    /// increase within a document.
    pub fn add_word(&mut self, term: &str, position: u64) -> Result<()> {
        self.check_usable()?;
        let docno = match (self.update_required, self.current_docno) {
            (true, Some(docno)) => docno,
            _ => {
                return Err(FalchionError::protocol_violation(
                    "add_word called without an active document",
                ));
            }
        };

        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        scratch.push_str(truncate_term(term));
        if let Some(stemmer) = &self.stemmer {
            stemmer.stem(&mut scratch);
        }

        let result = if scratch.is_empty() {
            Ok(())
        } else {
            self.record_word(&scratch, docno, position)
        };
        self.scratch = scratch;
        result
    }

    fn record_word(&mut self, term: &str, docno: u64, position: u64) -> Result<()> {
        let lookup = self
            .table
            .find_or_create(term, &mut self.pool, &mut self.arena, self.config.initial_buffer_len)
            .map_err(|e| self.fail(e))?;
        let id = lookup.id();

        let entry = self.pool.get(id);
        if !entry.accepts_position(position) {
            return Err(FalchionError::protocol_violation(format!(
                "position {position} of {term:?} does not follow the previous occurrence"
            )));
        }

        if entry.pending_offsets() == 0 {
            self.pool.get_mut(id).update_next = self.pending;
            self.pending = Some(id);
        }

        match self.pool.get_mut(id).record(docno, position) {
            Ok(bytes) => {
                self.postings_bytes += bytes;
                self.total_occurrences += 1;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Close the current document, correcting provisional counts, and
    /// return its statistics. Valid (and required) for documents that
    /// received no words.
    pub fn finalize_document(&mut self) -> Result<DocStats> {
        self.check_usable()?;
        if !self.update_required {
            return Err(FalchionError::protocol_violation(
                "finalize_document called without an open document",
            ));
        }
        let docno = self.current_docno.unwrap_or_default();

        let mut stats = DocStats::default();
        let mut weight = 0.0f64;
        let mut cur = self.pending.take();

        while let Some(id) = cur {
            let entry = self.pool.get_mut(id);
            cur = entry.update_next;

            let count = entry.pending_offsets();
            debug_assert!(count > 0);
            let fdt_log = 1.0 + (count as f64).ln();
            weight += fdt_log * fdt_log;
            stats.terms += count as u64;
            stats.distinct += 1;

            match entry.seal(docno) {
                Ok(widened) => self.postings_bytes += widened,
                Err(e) => return Err(self.fail(e)),
            }
        }

        stats.weight = weight.sqrt();
        self.update_required = false;
        Ok(stats)
    }

    /// Whether a document is open and must be finalized before anything
    /// else happens.
    pub fn needs_finalize(&self) -> bool {
        self.update_required
    }

    /// Drop the positions from every term's postings, keeping only
    /// `(docno_gap, count)` per document.
    ///
    /// This is one way: afterwards the store accepts no more documents and
    /// is only good for [`dump`](Self::dump) or [`clear`](Self::clear).
    /// Calling it again is a no-op.
    pub fn strip_offsets(&mut self) -> Result<()> {
        if self.failed {
            return Err(FalchionError::protocol_violation(
                "store is in a failed state",
            ));
        }
        if self.update_required {
            return Err(FalchionError::protocol_violation(
                "strip_offsets called while a document is open",
            ));
        }
        if self.stripped {
            return Ok(());
        }

        let mut removed = 0;
        for entry in self.pool.iter_mut() {
            removed += entry.strip_offsets()?;
        }
        self.postings_bytes -= removed;
        self.stripped = true;
        log::debug!(
            "stripped offsets from {} terms, {} bytes released",
            self.pool.len(),
            removed
        );
        Ok(())
    }

    /// Whether [`strip_offsets`](Self::strip_offsets) has been applied.
    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    /// Discard all postings and reset the counters, keeping the table and
    /// allocators for the next batch. Also leaves a failed state.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing {} terms from {} documents",
            self.pool.len(),
            self.documents
        );
        self.reset_batch();
        self.failed = false;
    }

    /// Release the store and everything it owns. Used when a batch has to
    /// be thrown away after an unrecoverable error.
    pub fn abort(self) {
        log::debug!(
            "aborting batch of {} terms (last error: {:?})",
            self.pool.len(),
            self.last_error
        );
        drop(self);
    }

    pub(crate) fn reset_batch(&mut self) {
        self.table.clear();
        self.pool.clear();
        self.arena.clear();
        self.current_docno = None;
        self.pending = None;
        self.update_required = false;
        self.total_occurrences = 0;
        self.documents = 0;
        self.postings_bytes = 0;
        self.stripped = false;
    }

    /// Encoded postings of `term` (which must already be stemmed), unless
    /// it is absent or stopped.
    pub fn postings(&self, term: &str) -> Option<&[u8]> {
        self.lookup(term).map(TermEntry::postings)
    }

    /// Summary of `term`'s accumulated postings, unless it is absent or
    /// stopped.
    pub fn term_info(&self, term: &str) -> Option<TermInfo> {
        self.lookup(term).map(|entry| TermInfo {
            doc_frequency: entry.doc_frequency(),
            total_occurrences: entry.total_occurrences(),
            last_docno: entry.last_docno(),
            postings_len: entry.postings().len(),
        })
    }

    fn lookup(&self, term: &str) -> Option<&TermEntry> {
        if self.stop.as_ref().is_some_and(|stop| stop.is_stopped(term)) {
            return None;
        }
        self.table
            .find(term, &self.pool, &self.arena)
            .map(|id| self.pool.get(id))
    }

    /// Bytes of encoded postings plus interned term text.
    pub fn size(&self) -> usize {
        self.postings_bytes + self.arena.bytes_used()
    }

    /// Estimated memory held by the store.
    pub fn memsize(&self) -> usize {
        mem::size_of::<Self>() + self.table.memory_usage() + self.pool.memory_usage() + self.size()
    }

    /// Whether the batch has grown past the configured flush threshold.
    pub fn should_dump(&self) -> bool {
        self.memsize() >= self.config.flush_memory_threshold
            && self.documents >= self.config.flush_min_documents
    }

    /// Number of distinct terms.
    pub fn distinct_terms(&self) -> usize {
        self.pool.len()
    }

    /// Number of term occurrences recorded.
    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    /// Number of documents begun in this batch.
    pub fn documents(&self) -> u64 {
        self.documents
    }

    /// Docno of the current or last document of this batch.
    pub fn current_docno(&self) -> Option<u64> {
        self.current_docno
    }

    /// Kind of the last allocation or I/O failure, if any.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Number of hash buckets.
    pub fn table_size(&self) -> usize {
        self.table.size()
    }

    pub fn config(&self) -> &PostingsConfig {
        &self.config
    }

    fn check_usable(&self) -> Result<()> {
        if self.failed {
            return Err(FalchionError::protocol_violation(
                "store is in a failed state",
            ));
        }
        if self.stripped {
            return Err(FalchionError::protocol_violation(
                "offsets were stripped; only dump or clear are allowed",
            ));
        }
        Ok(())
    }

    /// Record a failure that leaves the batch unusable.
    fn fail(&mut self, err: FalchionError) -> FalchionError {
        log::warn!("postings batch failed: {err}");
        self.last_error = Some(err.kind());
        self.failed = true;
        err
    }
}

/// Cut `term` to at most [`MAX_TERM_LEN`] bytes on a char boundary.
fn truncate_term(term: &str) -> &str {
    if term.len() <= MAX_TERM_LEN {
        return term;
    }
    let mut end = MAX_TERM_LEN;
    while !term.is_char_boundary(end) {
        end -= 1;
    }
    &term[..end]
}
