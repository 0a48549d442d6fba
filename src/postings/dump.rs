//! Serialization of a batch of postings.
//!
//! Each distinct term becomes one self-delimiting record, records appear in
//! ascending byte order of their terms, and all integers are varints:
//!
//! ```text
//! varint(term_len) term_bytes
//! varint(doc_frequency) varint(total_occurrences) varint(last_docno)
//! varint(postings_len) postings_bytes
//! ```
//!
//! Records are staged in a chunk buffer and written out whenever it fills.
//! Postings larger than the buffer are streamed through it in pieces, but a
//! record header must fit into an empty buffer.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::pool::EntryId;
use super::store::PostingsStore;
use crate::error::{FalchionError, Result};
use crate::util::varint::{self, MAX_VARINT_LEN};

/// Outcome of a successful dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpSummary {
    /// Records written.
    pub terms_written: usize,
    /// Terms dropped by the stop predicate.
    pub terms_stopped: usize,
    /// Bytes handed to the sink.
    pub bytes_written: u64,
}

impl PostingsStore {
    /// Write every term's postings to `out` in term order and reset the
    /// store for the next batch.
    ///
    /// Uses a chunk buffer of `dump_buffer_size` bytes. On failure the
    /// store keeps its contents; bytes already written to `out` are the
    /// caller's to discard.
    pub fn dump<W: Write>(&mut self, out: &mut W) -> Result<DumpSummary> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(self.config.dump_buffer_size)
            .map_err(|e| FalchionError::out_of_memory(format!("dump buffer: {e}")))?;
        buf.resize(self.config.dump_buffer_size, 0);
        self.dump_with_buffer(&mut buf, out)
    }

    /// Like [`dump`](Self::dump), staging output in the caller's `buf`.
    pub fn dump_with_buffer<W: Write>(&mut self, buf: &mut [u8], out: &mut W) -> Result<DumpSummary> {
        if self.failed {
            return Err(FalchionError::protocol_violation(
                "store is in a failed state",
            ));
        }
        if self.needs_finalize() {
            return Err(FalchionError::protocol_violation(
                "dump called while a document is open",
            ));
        }

        match self.write_records(buf, out) {
            Ok(summary) => {
                log::debug!(
                    "dumped {} terms ({} stopped), {} bytes, from {} documents",
                    summary.terms_written,
                    summary.terms_stopped,
                    summary.bytes_written,
                    self.documents()
                );
                self.reset_batch();
                Ok(summary)
            }
            Err(e) => {
                log::warn!("dump failed: {e}");
                if !matches!(e, FalchionError::InvalidArgument(_)) {
                    self.last_error = Some(e.kind());
                }
                Err(e)
            }
        }
    }

    fn write_records<W: Write>(&self, buf: &mut [u8], out: &mut W) -> Result<DumpSummary> {
        let mut order: Vec<EntryId> = Vec::new();
        order
            .try_reserve_exact(self.pool.len())
            .map_err(|e| FalchionError::out_of_memory(format!("dump snapshot: {e}")))?;

        let mut summary = DumpSummary::default();
        for (id, entry) in self.pool.iter() {
            let stopped = self
                .stop
                .as_ref()
                .is_some_and(|stop| stop.is_stopped(self.arena.get(entry.term)));
            if stopped {
                summary.terms_stopped += 1;
            } else {
                order.push(id);
            }
        }

        order.sort_unstable_by(|&a, &b| {
            let a = self.arena.get(self.pool.get(a).term);
            let b = self.arena.get(self.pool.get(b).term);
            a.as_bytes().cmp(b.as_bytes())
        });

        let mut writer = ChunkWriter::new(buf, out);
        for id in order {
            let entry = self.pool.get(id);
            let term = self.arena.get(entry.term).as_bytes();
            let postings = entry.postings();
            let fields = [
                term.len() as u64,
                entry.doc_frequency(),
                entry.total_occurrences(),
                entry.last_docno().unwrap_or_default(),
                postings.len() as u64,
            ];

            let header_len = term.len() + fields.iter().map(|&v| varint::encoded_len(v)).sum::<usize>();
            writer.reserve(header_len)?;

            writer.put_varint(fields[0]);
            writer.put_bytes(term)?;
            for &value in &fields[1..] {
                writer.put_varint(value);
            }
            writer.put_bytes(postings)?;
            summary.terms_written += 1;
        }
        writer.flush()?;

        summary.bytes_written = writer.written;
        Ok(summary)
    }
}

/// Stages bytes in a fixed buffer in front of a sink.
struct ChunkWriter<'a, W: Write> {
    buf: &'a mut [u8],
    pos: usize,
    out: &'a mut W,
    written: u64,
}

impl<'a, W: Write> ChunkWriter<'a, W> {
    fn new(buf: &'a mut [u8], out: &'a mut W) -> Self {
        ChunkWriter {
            buf,
            pos: 0,
            out,
            written: 0,
        }
    }

    /// Make `len` contiguous bytes available, flushing if necessary.
    fn reserve(&mut self, len: usize) -> Result<()> {
        if len > self.buf.len() {
            return Err(FalchionError::invalid_argument(format!(
                "dump buffer of {} bytes cannot hold a {len} byte record header",
                self.buf.len()
            )));
        }
        if self.buf.len() - self.pos < len {
            self.flush()?;
        }
        Ok(())
    }

    /// Append a varint; room must have been reserved.
    fn put_varint(&mut self, value: u64) {
        let mut scratch = [0u8; MAX_VARINT_LEN];
        let len = varint::encode_into(value, &mut scratch);
        self.buf[self.pos..self.pos + len].copy_from_slice(&scratch[..len]);
        self.pos += len;
    }

    /// Append `bytes`, flushing as often as the buffer fills.
    fn put_bytes(&mut self, mut bytes: &[u8]) -> Result<()> {
        while !bytes.is_empty() {
            if self.pos == self.buf.len() {
                self.flush()?;
            }
            let n = bytes.len().min(self.buf.len() - self.pos);
            self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
            self.pos += n;
            bytes = &bytes[n..];
        }
        Ok(())
    }

    /// Hand the staged bytes to the sink, resuming after short writes.
    fn flush(&mut self) -> Result<()> {
        let mut start = 0;
        while start < self.pos {
            match self.out.write(&self.buf[start..self.pos]) {
                Ok(0) => {
                    return Err(FalchionError::Io(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "dump sink accepted no bytes",
                    )));
                }
                Ok(n) => start += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.written += self.pos as u64;
        self.pos = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::postings::config::PostingsConfig;

    /// Accepts at most `max` bytes per call and fails after `limit` bytes.
    struct TrickleSink {
        data: Vec<u8>,
        max: usize,
        limit: Option<usize>,
        interrupted: bool,
    }

    impl Write for TrickleSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            if let Some(limit) = self.limit
                && self.data.len() >= limit
            {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.max);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn sample_store() -> PostingsStore {
        let mut store = PostingsStore::new(PostingsConfig::with_table_size(16)).unwrap();
        store.begin_document(0).unwrap();
        store.add_word("b", 0).unwrap();
        store.add_word("a", 1).unwrap();
        store.finalize_document().unwrap();
        store.begin_document(1).unwrap();
        for position in 0..300 {
            store.add_word("a", position).unwrap();
        }
        store.finalize_document().unwrap();
        store
    }

    #[test]
    fn test_short_writes_are_resumed() {
        let mut expected = Vec::new();
        sample_store().dump(&mut expected).unwrap();

        let mut store = sample_store();
        let mut sink = TrickleSink {
            data: Vec::new(),
            max: 3,
            limit: None,
            interrupted: false,
        };
        let mut buf = [0u8; 64];
        let summary = store.dump_with_buffer(&mut buf, &mut sink).unwrap();

        assert_eq!(sink.data, expected);
        assert_eq!(summary.terms_written, 2);
        assert_eq!(summary.bytes_written, expected.len() as u64);
        assert_eq!(store.distinct_terms(), 0);
    }

    #[test]
    fn test_hard_error_keeps_store() {
        let mut store = sample_store();
        let mut sink = TrickleSink {
            data: Vec::new(),
            max: 8,
            limit: Some(16),
            interrupted: true,
        };
        let mut buf = [0u8; 32];

        let err = store.dump_with_buffer(&mut buf, &mut sink).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert_eq!(store.last_error(), Some(crate::error::ErrorKind::Io));
        assert_eq!(store.distinct_terms(), 2);

        // The intact store can still be dumped elsewhere.
        let mut out = Vec::new();
        assert_eq!(store.dump(&mut out).unwrap().terms_written, 2);
    }

    #[test]
    fn test_buffer_too_small_for_header() {
        let mut store = sample_store();
        let mut buf = [0u8; 4];
        let mut out = Vec::new();

        let err = store.dump_with_buffer(&mut buf, &mut out).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
        assert_eq!(store.last_error(), None);
        assert_eq!(store.distinct_terms(), 2);
    }

    #[test]
    fn test_zero_length_write_is_an_error() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut store = sample_store();
        let err = store.dump(&mut Full).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_empty_store_dumps_nothing() {
        let mut store = PostingsStore::new(PostingsConfig::with_table_size(4)).unwrap();
        let mut out = Vec::new();
        let summary = store.dump(&mut out).unwrap();
        assert_eq!(summary, DumpSummary::default());
        assert!(out.is_empty());
    }
}
