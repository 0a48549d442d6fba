//! # Falchion
//!
//! In-memory postings accumulation for inverted index construction.
//!
//! ## Features
//!
//! - Per-term compressed postings built one document at a time
//! - Move-to-front term hash table tuned for skewed vocabularies
//! - Sorted, self-delimiting run files written through a bounded buffer
//! - Optional stemming, dump-time stopping and offset stripping
//! - A batch indexer and command line tool that spill runs to disk

pub mod analysis;
pub mod cli;
pub mod error;
pub mod indexer;
pub mod postings;
pub mod util;

pub mod prelude {
    pub use crate::analysis::{IdentityStemmer, Stemmer, StopList, StopPredicate, SuffixStemmer};
    pub use crate::error::{ErrorKind, FalchionError, Result};
    pub use crate::indexer::{BatchIndexer, IndexSummary};
    pub use crate::postings::{DocStats, DumpReader, DumpRecord, PostingsConfig, PostingsStore};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
