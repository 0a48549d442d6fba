//! Configuration for a postings store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FalchionError, Result};
use crate::util::varint::MAX_VARINT_LEN;

/// Longest term, in bytes, accepted by a store. Longer terms are truncated.
pub const MAX_TERM_LEN: usize = 1024;

/// Largest record header a dump can produce: the term length, the term
/// itself and four counters.
pub const MAX_RECORD_HEADER_LEN: usize = MAX_VARINT_LEN + MAX_TERM_LEN + 4 * MAX_VARINT_LEN;

/// Settings for building one batch of postings in memory.
///
/// # Example
///
/// ```
/// use falchion::postings::PostingsConfig;
///
/// let mut config = PostingsConfig::default();
/// config.table_size = 1000;
/// assert_eq!(config.bucket_count(), 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostingsConfig {
    /// Requested number of hash buckets, rounded up to a power of two.
    ///
    /// The table never grows, so this should be dimensioned from the
    /// expected vocabulary of one batch.
    pub table_size: usize,

    /// Initial size in bytes of each term's postings buffer.
    pub initial_buffer_len: usize,

    /// Size of the chunk buffer [`dump`](crate::postings::PostingsStore::dump)
    /// allocates for itself.
    pub dump_buffer_size: usize,

    /// Memory footprint at which a batch should be dumped.
    pub flush_memory_threshold: usize,

    /// Minimum number of documents in a batch before a memory triggered
    /// dump is suggested.
    pub flush_min_documents: u64,
}

impl Default for PostingsConfig {
    fn default() -> Self {
        PostingsConfig {
            table_size: 1 << 16,
            initial_buffer_len: 8,
            dump_buffer_size: 64 * 1024,
            flush_memory_threshold: 64 * 1024 * 1024,
            flush_min_documents: 1,
        }
    }
}

impl PostingsConfig {
    /// Create a config with the given table size and defaults otherwise.
    pub fn with_table_size(table_size: usize) -> Self {
        PostingsConfig {
            table_size,
            ..Default::default()
        }
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PostingsConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Log2 of the bucket count.
    pub fn table_bits(&self) -> u32 {
        self.table_size.max(1).next_power_of_two().trailing_zeros()
    }

    /// Actual number of hash buckets.
    pub fn bucket_count(&self) -> usize {
        1usize << self.table_bits()
    }

    /// Check that the settings are usable.
    pub fn validate(&self) -> Result<()> {
        if self.table_size == 0 {
            return Err(FalchionError::invalid_config("table_size must be positive"));
        }
        if self.table_size > u32::MAX as usize {
            return Err(FalchionError::invalid_config(format!(
                "table_size {} exceeds {}",
                self.table_size,
                u32::MAX
            )));
        }
        if self.initial_buffer_len == 0 {
            return Err(FalchionError::invalid_config(
                "initial_buffer_len must be positive",
            ));
        }
        if self.dump_buffer_size < MAX_RECORD_HEADER_LEN {
            return Err(FalchionError::invalid_config(format!(
                "dump_buffer_size {} is smaller than the largest record header ({} bytes)",
                self.dump_buffer_size, MAX_RECORD_HEADER_LEN
            )));
        }
        Ok(())
    }
}
