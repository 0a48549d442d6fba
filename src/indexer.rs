//! Batch index construction on top of a [`PostingsStore`].
//!
//! The indexer feeds tokenized documents into a store, and whenever the
//! store reports that the batch is big enough it dumps the batch to a new
//! run file in the output directory. Run files are named `run_00000.dump`,
//! `run_00001.dump` and so on; merging them is left to a later stage.
//!
//! Docnos are assigned by the indexer and keep increasing across runs, so
//! a document's docno is its position in the input.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::tokenize;
use crate::error::Result;
use crate::postings::{DocStats, DumpSummary, PostingsStore};

/// Totals of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Documents indexed.
    pub documents: u64,
    /// Run files written.
    pub runs: usize,
    /// Term occurrences added across all runs.
    pub total_occurrences: u64,
    /// Records written across all runs.
    pub terms_written: usize,
    /// Bytes written across all runs.
    pub bytes_written: u64,
    /// Mean document weight.
    pub average_weight: f64,
    pub run_paths: Vec<PathBuf>,
}

/// Drives a [`PostingsStore`] over a stream of documents, spilling runs to
/// disk.
#[derive(Debug)]
pub struct BatchIndexer {
    store: PostingsStore,
    output_dir: PathBuf,
    strip_offsets: bool,
    next_docno: u64,
    dump_buffer: Vec<u8>,
    summary: IndexSummary,
    weight_sum: f64,
}

impl BatchIndexer {
    /// Create an indexer writing runs into `output_dir`, which is created if
    /// missing.
    pub fn new<P: AsRef<Path>>(store: PostingsStore, output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;

        let dump_buffer = vec![0u8; store.config().dump_buffer_size];
        Ok(BatchIndexer {
            store,
            output_dir,
            strip_offsets: false,
            next_docno: 0,
            dump_buffer,
            summary: IndexSummary::default(),
            weight_sum: 0.0,
        })
    }

    /// Write runs with document counts only, dropping word positions.
    pub fn strip_offsets(mut self, strip: bool) -> Self {
        self.strip_offsets = strip;
        self
    }

    /// Index one document and return its statistics.
    ///
    /// The document gets the next docno even if it contains no words.
    pub fn add_document(&mut self, text: &str) -> Result<DocStats> {
        let docno = self.next_docno;
        self.store.begin_document(docno)?;
        for (term, position) in tokenize(text) {
            self.store.add_word(&term, position)?;
        }
        let stats = self.store.finalize_document()?;
        self.next_docno += 1;

        self.summary.documents += 1;
        self.summary.total_occurrences += stats.terms;
        self.weight_sum += stats.weight;

        if self.store.should_dump() {
            log::info!(
                "batch reached {} bytes after docno {docno}, dumping",
                self.store.memsize()
            );
            self.dump_run()?;
        }
        Ok(stats)
    }

    /// Docno the next document will receive.
    pub fn next_docno(&self) -> u64 {
        self.next_docno
    }

    /// The store being filled.
    pub fn store(&self) -> &PostingsStore {
        &self.store
    }

    /// Dump the current batch to a new run file, unless it is empty.
    pub fn flush(&mut self) -> Result<Option<PathBuf>> {
        if self.store.documents() == 0 {
            return Ok(None);
        }
        self.dump_run().map(Some)
    }

    /// Flush the last batch and report the totals.
    pub fn finish(mut self) -> Result<IndexSummary> {
        self.flush()?;
        if self.summary.documents > 0 {
            self.summary.average_weight = self.weight_sum / self.summary.documents as f64;
        }
        log::info!(
            "indexed {} documents into {} runs",
            self.summary.documents,
            self.summary.runs
        );
        Ok(self.summary)
    }

    fn dump_run(&mut self) -> Result<PathBuf> {
        if self.strip_offsets {
            self.store.strip_offsets()?;
        }

        let path = self
            .output_dir
            .join(format!("run_{:05}.dump", self.summary.runs));
        let dumped = write_run(&mut self.store, &mut self.dump_buffer, &path);
        let dump = match dumped {
            Ok(dump) => dump,
            Err(e) => {
                // The store keeps the batch; the partial file is useless.
                let _ = fs::remove_file(&path);
                log::error!("failed to write run {}: {e}", path.display());
                return Err(e);
            }
        };

        log::debug!(
            "wrote {} ({} terms, {} bytes)",
            path.display(),
            dump.terms_written,
            dump.bytes_written
        );
        self.summary.runs += 1;
        self.summary.terms_written += dump.terms_written;
        self.summary.bytes_written += dump.bytes_written;
        self.summary.run_paths.push(path.clone());
        Ok(path)
    }
}

fn write_run(store: &mut PostingsStore, buf: &mut [u8], path: &Path) -> Result<DumpSummary> {
    let mut out = BufWriter::new(File::create(path)?);
    let summary = store.dump_with_buffer(buf, &mut out)?;
    out.flush()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::{DumpReader, PostingsConfig};
    use tempfile::TempDir;

    fn small_store(threshold: usize) -> PostingsStore {
        let mut config = PostingsConfig::with_table_size(64);
        config.flush_memory_threshold = threshold;
        PostingsStore::new(config).unwrap()
    }

    #[test]
    fn test_single_run() {
        let dir = TempDir::new().unwrap();
        let mut indexer = BatchIndexer::new(small_store(usize::MAX), dir.path()).unwrap();

        indexer.add_document("the quick brown fox").unwrap();
        indexer.add_document("the lazy dog").unwrap();
        let summary = indexer.finish().unwrap();

        assert_eq!(summary.documents, 2);
        assert_eq!(summary.runs, 1);
        assert_eq!(summary.total_occurrences, 7);
        assert_eq!(summary.terms_written, 6);
        assert!(summary.run_paths[0].ends_with("run_00000.dump"));

        let file = File::open(&summary.run_paths[0]).unwrap();
        let records: Vec<_> = DumpReader::new(file).collect::<Result<_>>().unwrap();
        let the = records.iter().find(|r| r.term == "the").unwrap();
        assert_eq!(the.doc_frequency, 2);
        assert_eq!(the.last_docno, 1);
    }

    #[test]
    fn test_docnos_continue_across_runs() {
        let dir = TempDir::new().unwrap();
        // A zero threshold dumps after every document.
        let mut indexer = BatchIndexer::new(small_store(0), dir.path()).unwrap();

        for text in ["alpha", "beta", "alpha"] {
            indexer.add_document(text).unwrap();
        }
        assert_eq!(indexer.next_docno(), 3);
        let summary = indexer.finish().unwrap();
        assert_eq!(summary.runs, 3);

        let file = File::open(&summary.run_paths[2]).unwrap();
        let record = DumpReader::new(file).next().unwrap().unwrap();
        assert_eq!(record.term, "alpha");
        assert_eq!(record.groups().unwrap()[0].docno, 2);
    }

    #[test]
    fn test_empty_build_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let indexer = BatchIndexer::new(small_store(usize::MAX), dir.path()).unwrap();
        let summary = indexer.finish().unwrap();
        assert_eq!(summary.runs, 0);
        assert_eq!(summary.average_weight, 0.0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_strip_offsets_runs() {
        let dir = TempDir::new().unwrap();
        let mut indexer = BatchIndexer::new(small_store(usize::MAX), dir.path())
            .unwrap()
            .strip_offsets(true);
        indexer.add_document("to be or not to be").unwrap();
        let summary = indexer.finish().unwrap();

        let file = File::open(&summary.run_paths[0]).unwrap();
        let records: Vec<_> = DumpReader::new(file).collect::<Result<_>>().unwrap();
        let to = records.iter().find(|r| r.term == "to").unwrap();
        assert_eq!(to.counts().unwrap()[0].count, 2);
    }
}
