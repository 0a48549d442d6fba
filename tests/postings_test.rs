use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use falchion::analysis::SuffixStemmer;
use falchion::error::{ErrorKind, Result};
use falchion::postings::{DumpReader, DumpRecord, EntryPool, PostingsConfig, PostingsStore};
use falchion::util::arena::TermArena;

/// Documents as `(docno, terms)`, each term's position being its index.
type Batch = Vec<(u64, Vec<String>)>;

fn random_batch(rng: &mut StdRng, documents: usize, vocabulary: usize) -> Batch {
    let mut docno = rng.random_range(0..3u64);
    let mut batch = Vec::with_capacity(documents);
    for _ in 0..documents {
        // Some documents repeat a small vocabulary often enough to need
        // multi-byte occurrence counts.
        let (len, vocab) = if rng.random_bool(0.1) {
            (rng.random_range(200..600), 3)
        } else {
            (rng.random_range(0..40), vocabulary)
        };
        let terms = (0..len)
            .map(|_| format!("w{}", rng.random_range(0..vocab)))
            .collect();
        batch.push((docno, terms));
        docno += rng.random_range(1..1000u64);
    }
    batch
}

fn fill(store: &mut PostingsStore, batch: &Batch) -> Result<()> {
    for (docno, terms) in batch {
        store.begin_document(*docno)?;
        for (position, term) in terms.iter().enumerate() {
            store.add_word(term, position as u64)?;
        }
        store.finalize_document()?;
    }
    Ok(())
}

fn dump_records(store: &mut PostingsStore) -> Result<(Vec<u8>, Vec<DumpRecord>)> {
    let mut out = Vec::new();
    store.dump(&mut out)?;
    let records = DumpReader::new(&out[..]).collect::<Result<Vec<_>>>()?;
    Ok((out, records))
}

/// `(term, docno) -> positions` for every occurrence in the batch.
fn expected_occurrences(batch: &Batch) -> BTreeMap<(String, u64), Vec<u64>> {
    let mut expected: BTreeMap<(String, u64), Vec<u64>> = BTreeMap::new();
    for (docno, terms) in batch {
        for (position, term) in terms.iter().enumerate() {
            expected
                .entry((term.clone(), *docno))
                .or_default()
                .push(position as u64);
        }
    }
    expected
}

#[test]
fn test_two_document_scenario() -> Result<()> {
    let mut store = PostingsStore::new(PostingsConfig::with_table_size(16))?;

    store.begin_document(0)?;
    store.add_word("a", 0)?;
    store.add_word("b", 1)?;
    store.finalize_document()?;
    store.begin_document(1)?;
    store.add_word("a", 0)?;
    store.finalize_document()?;

    let (_, records) = dump_records(&mut store)?;
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].term, "a");
    assert_eq!(records[0].doc_frequency, 2);
    assert_eq!(records[0].total_occurrences, 2);
    assert_eq!(records[0].last_docno, 1);

    assert_eq!(records[1].term, "b");
    assert_eq!(records[1].doc_frequency, 1);
    assert_eq!(records[1].total_occurrences, 1);
    assert_eq!(records[1].last_docno, 0);
    Ok(())
}

#[test]
fn test_random_batches_roundtrip() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for table_size in [1, 16, 4096] {
        let batch = random_batch(&mut rng, 150, 300);
        let mut store = PostingsStore::new(PostingsConfig::with_table_size(table_size))?;
        fill(&mut store, &batch)?;

        let expected = expected_occurrences(&batch);
        let total: u64 = expected.values().map(|p| p.len() as u64).sum();
        assert_eq!(store.total_occurrences(), total);

        let (_, records) = dump_records(&mut store)?;

        let terms: Vec<&str> = records.iter().map(|r| r.term.as_str()).collect();
        let mut sorted = terms.clone();
        sorted.sort_unstable();
        assert_eq!(terms, sorted);

        let mut decoded = BTreeMap::new();
        for record in &records {
            let groups = record.groups()?;
            assert!(groups.windows(2).all(|w| w[0].docno < w[1].docno));
            assert_eq!(record.last_docno, groups.last().map(|g| g.docno).unwrap_or_default());
            for group in groups {
                decoded.insert((record.term.clone(), group.docno), group.positions);
            }
        }
        assert_eq!(decoded, expected);
    }
    Ok(())
}

#[test]
fn test_strip_offsets_keeps_counts() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(17);
    let batch = random_batch(&mut rng, 80, 50);

    let mut full = PostingsStore::new(PostingsConfig::with_table_size(256))?;
    fill(&mut full, &batch)?;
    let (_, with_positions) = dump_records(&mut full)?;

    let mut stripped = PostingsStore::new(PostingsConfig::with_table_size(256))?;
    fill(&mut stripped, &batch)?;
    let size_before = stripped.size();
    stripped.strip_offsets()?;
    assert!(stripped.size() < size_before);
    let (_, without_positions) = dump_records(&mut stripped)?;

    assert_eq!(with_positions.len(), without_positions.len());
    for (full, stripped) in with_positions.iter().zip(&without_positions) {
        assert_eq!(full.term, stripped.term);
        assert_eq!(full.doc_frequency, stripped.doc_frequency);
        assert_eq!(full.total_occurrences, stripped.total_occurrences);

        let counts: Vec<(u64, u64)> = full
            .groups()?
            .iter()
            .map(|g| (g.docno, g.positions.len() as u64))
            .collect();
        let stripped_counts: Vec<(u64, u64)> =
            stripped.counts()?.iter().map(|c| (c.docno, c.count)).collect();
        assert_eq!(counts, stripped_counts);
    }
    Ok(())
}

#[test]
fn test_reused_store_matches_fresh_store() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(99);
    let first = random_batch(&mut rng, 60, 100);
    let second = random_batch(&mut rng, 60, 100);

    let mut reused = PostingsStore::new(PostingsConfig::with_table_size(64))?;
    fill(&mut reused, &first)?;
    dump_records(&mut reused)?;
    reused.clear();
    assert_eq!(reused.distinct_terms(), 0);
    assert_eq!(reused.total_occurrences(), 0);
    assert_eq!(reused.documents(), 0);

    fill(&mut reused, &second)?;
    let (reused_bytes, _) = dump_records(&mut reused)?;

    let mut fresh = PostingsStore::new(PostingsConfig::with_table_size(64))?;
    fill(&mut fresh, &second)?;
    let (fresh_bytes, _) = dump_records(&mut fresh)?;

    assert_eq!(reused_bytes, fresh_bytes);
    Ok(())
}

#[test]
fn test_stemming_and_stopping() -> Result<()> {
    let mut store = PostingsStore::builder(PostingsConfig::with_table_size(64))
        .stemmer(Box::new(SuffixStemmer::new()))
        .stop_words(|term: &str| term == "jump")
        .build()?;

    store.begin_document(0)?;
    for (position, word) in ["jumping", "foxes", "jumped", "walked"].iter().enumerate() {
        store.add_word(word, position as u64)?;
    }
    let stats = store.finalize_document()?;
    assert_eq!(stats.terms, 4);
    assert_eq!(stats.distinct, 3);

    assert!(store.postings("jump").is_none());
    assert_eq!(store.term_info("walk").map(|t| t.total_occurrences), Some(1));

    let mut out = Vec::new();
    let summary = store.dump(&mut out)?;
    assert_eq!(summary.terms_written, 2);
    assert_eq!(summary.terms_stopped, 1);

    let terms: Vec<String> = DumpReader::new(&out[..])
        .map(|r| r.map(|r| r.term))
        .collect::<Result<_>>()?;
    assert_eq!(terms, vec!["fox", "walk"]);
    Ok(())
}

#[test]
fn test_injected_allocators() -> Result<()> {
    let mut pool = EntryPool::with_capacity(128);
    let mut arena = TermArena::with_capacity(1024);
    // Leftovers from an earlier user are discarded.
    arena.intern("stale")?;
    assert!(pool.is_empty());

    let mut store = PostingsStore::builder(PostingsConfig::with_table_size(32))
        .allocators(std::mem::take(&mut pool), std::mem::take(&mut arena))
        .build()?;
    store.begin_document(5)?;
    store.add_word("fresh", 0)?;
    store.finalize_document()?;

    let (_, records) = dump_records(&mut store)?;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].term, "fresh");
    assert_eq!(records[0].last_docno, 5);
    Ok(())
}

#[test]
fn test_protocol_violations_are_recoverable() -> Result<()> {
    let mut store = PostingsStore::new(PostingsConfig::with_table_size(16))?;

    let err = store.add_word("x", 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolViolation);

    store.begin_document(3)?;
    store.add_word("x", 0)?;
    assert!(store.needs_finalize());
    assert_eq!(
        store.dump(&mut Vec::<u8>::new()).unwrap_err().kind(),
        ErrorKind::ProtocolViolation
    );
    store.finalize_document()?;

    assert_eq!(
        store.begin_document(3).unwrap_err().kind(),
        ErrorKind::ProtocolViolation
    );
    assert_eq!(store.last_error(), None);

    store.begin_document(4)?;
    store.add_word("x", 0)?;
    store.finalize_document()?;
    assert_eq!(store.term_info("x").map(|t| t.doc_frequency), Some(2));
    Ok(())
}
