//! Decoding of dumped postings.
//!
//! [`DumpReader`] walks the records written by
//! [`PostingsStore::dump`](crate::postings::PostingsStore::dump) and
//! [`DumpRecord`] decodes a record's postings back into documents and
//! positions. It does not merge runs or answer queries.

use std::io::{self, Read};

use byteorder::ReadBytesExt;

use crate::error::{FalchionError, Result};
use crate::util::varint;

/// One term's record from a dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpRecord {
    pub term: String,
    pub doc_frequency: u64,
    pub total_occurrences: u64,
    pub last_docno: u64,
    /// Concatenated per-document groups.
    pub postings: Vec<u8>,
}

/// A document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocPostings {
    pub docno: u64,
    pub positions: Vec<u64>,
}

/// A document's occurrence count of a term, as left by offset stripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocCount {
    pub docno: u64,
    pub count: u64,
}

impl DumpRecord {
    /// Decode postings that still carry positions.
    pub fn groups(&self) -> Result<Vec<DocPostings>> {
        let mut cursor = GroupCursor::new(&self.postings);
        let mut groups = Vec::new();

        while let Some((docno, count)) = cursor.next_header()? {
            let count = usize::try_from(count)
                .map_err(|_| FalchionError::corrupt("occurrence count overflows"))?;
            let mut positions = Vec::with_capacity(count.min(cursor.remaining()));
            let mut last: Option<u64> = None;
            for _ in 0..count {
                let gap = cursor.value("position gap")?;
                let position = last
                    .map_or(Some(gap), |p| p.checked_add(gap)?.checked_add(1))
                    .ok_or_else(|| FalchionError::corrupt("position overflows"))?;
                positions.push(position);
                last = Some(position);
            }
            groups.push(DocPostings { docno, positions });
        }

        self.check_totals(groups.len(), groups.iter().map(|g| g.positions.len() as u64).sum())?;
        Ok(groups)
    }

    /// Decode postings produced after
    /// [`strip_offsets`](crate::postings::PostingsStore::strip_offsets).
    pub fn counts(&self) -> Result<Vec<DocCount>> {
        let mut cursor = GroupCursor::new(&self.postings);
        let mut counts = Vec::new();

        while let Some((docno, count)) = cursor.next_header()? {
            counts.push(DocCount { docno, count });
        }

        self.check_totals(counts.len(), counts.iter().map(|c| c.count).sum())?;
        Ok(counts)
    }

    fn check_totals(&self, docs: usize, occurrences: u64) -> Result<()> {
        if docs as u64 != self.doc_frequency || occurrences != self.total_occurrences {
            return Err(FalchionError::corrupt(format!(
                "postings of {:?} hold {docs} documents and {occurrences} occurrences, header says {} and {}",
                self.term, self.doc_frequency, self.total_occurrences
            )));
        }
        Ok(())
    }
}

/// Walks the group headers of a postings buffer.
struct GroupCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    last_docno: Option<u64>,
}

impl<'a> GroupCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        GroupCursor {
            bytes,
            pos: 0,
            last_docno: None,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn value(&mut self, what: &str) -> Result<u64> {
        let (value, n) = varint::decode(&self.bytes[self.pos..])
            .ok_or_else(|| FalchionError::corrupt(format!("truncated {what}")))?;
        self.pos += n;
        Ok(value)
    }

    /// Next `(docno, count)`, or `None` at the end of the buffer.
    fn next_header(&mut self) -> Result<Option<(u64, u64)>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        let gap = self.value("docno gap")?;
        let docno = self
            .last_docno
            .map_or(Some(gap), |d| d.checked_add(gap)?.checked_add(1))
            .ok_or_else(|| FalchionError::corrupt("docno overflows"))?;
        let count = self.value("occurrence count")?;
        if count == 0 {
            return Err(FalchionError::corrupt("zero occurrence count"));
        }
        self.last_docno = Some(docno);
        Ok(Some((docno, count)))
    }
}

/// Iterator over the records of a dump stream.
pub struct DumpReader<R: Read> {
    reader: R,
    done: bool,
}

impl<R: Read> DumpReader<R> {
    pub fn new(reader: R) -> Self {
        DumpReader {
            reader,
            done: false,
        }
    }

    /// Read the next record, or `None` at a clean end of stream.
    pub fn read_record(&mut self) -> Result<Option<DumpRecord>> {
        let term_len = match self.reader.read_u8() {
            Ok(first) => self.finish_varint(first)?,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let term_bytes = self.read_bytes(term_len)?;
        let term = String::from_utf8(term_bytes)
            .map_err(|e| FalchionError::corrupt(format!("term is not UTF-8: {e}")))?;
        let doc_frequency = varint::read_u64(&mut self.reader)?;
        let total_occurrences = varint::read_u64(&mut self.reader)?;
        let last_docno = varint::read_u64(&mut self.reader)?;
        let postings_len = varint::read_u64(&mut self.reader)?;
        let postings = self.read_bytes(postings_len)?;

        Ok(Some(DumpRecord {
            term,
            doc_frequency,
            total_occurrences,
            last_docno,
            postings,
        }))
    }

    /// Complete a varint whose first byte was already consumed.
    fn finish_varint(&mut self, first: u8) -> Result<u64> {
        if first & 0x80 == 0 {
            return Ok(first as u64);
        }
        let rest = varint::read_u64(&mut self.reader)?;
        if rest > u64::MAX >> 7 {
            return Err(FalchionError::corrupt("VarInt overflow"));
        }
        Ok((first & 0x7F) as u64 | (rest << 7))
    }

    fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        let read = (&mut self.reader).take(len).read_to_end(&mut bytes)?;
        if read as u64 != len {
            return Err(FalchionError::corrupt(format!(
                "record truncated: expected {len} bytes, found {read}"
            )));
        }
        Ok(bytes)
    }
}

impl<R: Read> Iterator for DumpReader<R> {
    type Item = Result<DumpRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
