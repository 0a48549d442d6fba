//! Command implementations for the Falchion CLI.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::analysis::{StopList, SuffixStemmer};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::Result;
use crate::indexer::BatchIndexer;
use crate::postings::{DumpReader, PostingsConfig, PostingsStore};

/// Execute a CLI command.
pub fn execute_command(args: FalchionArgs) -> Result<()> {
    match &args.command {
        Command::Build(build_args) => build_runs(build_args.clone(), &args),
        Command::Inspect(inspect_args) => inspect_run(inspect_args.clone(), &args),
    }
}

/// Index the input files into runs.
fn build_runs(args: BuildArgs, cli_args: &FalchionArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            log::info!("loading postings configuration from {}", path.display());
            PostingsConfig::from_json_file(path)?
        }
        None => PostingsConfig::default(),
    };

    let store = build_store(&args, config)?;
    let mut indexer = BatchIndexer::new(store, &args.output)?.strip_offsets(args.no_offsets);

    let start_time = Instant::now();
    for input in &args.inputs {
        index_file(&mut indexer, input, cli_args)?;
    }
    let summary = indexer.finish()?;
    let duration = start_time.elapsed();

    let docs_per_second = if duration.as_secs_f64() > 0.0 {
        summary.documents as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    output_result(
        "Runs built successfully",
        &BuildResult {
            summary,
            inputs: args.inputs.len(),
            duration_ms: duration.as_millis() as u64,
            docs_per_second,
        },
        cli_args,
    )
}

fn build_store(args: &BuildArgs, config: PostingsConfig) -> Result<PostingsStore> {
    let mut builder = PostingsStore::builder(config);

    if args.stem == StemMode::Simple {
        builder = builder.stemmer(Box::new(SuffixStemmer::new()));
    }

    if args.stop {
        let mut stop = StopList::new();
        if let Some(path) = &args.stop_file {
            let added = stop.add_file(path)?;
            log::info!("added {added} stop words from {}", path.display());
        }
        builder = builder.stop_words(stop);
    }

    builder.build()
}

/// Feed every non-empty line of `path` to the indexer as a document.
fn index_file(indexer: &mut BatchIndexer, path: &Path, cli_args: &FalchionArgs) -> Result<()> {
    log::info!("indexing {}", path.display());
    let reader = BufReader::new(File::open(path)?);

    let mut docs = 0u64;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        indexer.add_document(&line)?;
        docs += 1;

        if docs % 10_000 == 0 && cli_args.verbosity() > 1 {
            println!("Processed {docs} documents from {}...", path.display());
        }
    }

    log::debug!("{docs} documents read from {}", path.display());
    Ok(())
}

/// Decode a run file and list its records.
fn inspect_run(args: InspectArgs, cli_args: &FalchionArgs) -> Result<()> {
    let reader = DumpReader::new(BufReader::new(File::open(&args.dump)?));
    let limit = args.limit.unwrap_or(usize::MAX);

    let mut result = InspectResult {
        path: args.dump.to_string_lossy().to_string(),
        total_records: 0,
        total_occurrences: 0,
        postings_bytes: 0,
        records: Vec::new(),
    };

    for record in reader {
        let record = record?;
        result.total_records += 1;
        result.total_occurrences += record.total_occurrences;
        result.postings_bytes += record.postings.len() as u64;

        if result.records.len() < limit {
            // Decoding validates the postings against the header.
            let first_docno = if args.counts {
                record.counts()?.first().map(|c| c.docno)
            } else {
                record.groups()?.first().map(|g| g.docno)
            };
            result.records.push(RecordSummary {
                postings_bytes: record.postings.len(),
                term: record.term,
                doc_frequency: record.doc_frequency,
                total_occurrences: record.total_occurrences,
                last_docno: record.last_docno,
                first_docno,
            });
        }
    }

    output_result("Run decoded successfully", &result, cli_args)
}
