//! In-memory accumulation of compressed postings.
//!
//! A [`PostingsStore`] collects, for each distinct term, the documents and
//! word positions it occurs at, encoded as delta varints in a growable
//! per-term buffer. When the batch is large enough it is written out with
//! [`PostingsStore::dump`] as a sorted run and the store starts over.

pub mod config;
pub mod dump;
pub mod entry;
pub mod pool;
pub mod reader;
pub mod store;
pub mod table;

pub use config::{MAX_TERM_LEN, PostingsConfig};
pub use dump::DumpSummary;
pub use entry::TermEntry;
pub use pool::{EntryId, EntryPool};
pub use reader::{DocCount, DocPostings, DumpReader, DumpRecord};
pub use store::{DocStats, PostingsStore, PostingsStoreBuilder, TermInfo};
pub use table::{Lookup, TermTable};
