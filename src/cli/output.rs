//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{FalchionArgs, OutputFormat};
use crate::error::Result;
use crate::indexer::IndexSummary;

/// Result structure for a build.
#[derive(Debug, Serialize, Deserialize)]
pub struct BuildResult {
    #[serde(flatten)]
    pub summary: IndexSummary,
    pub inputs: usize,
    pub duration_ms: u64,
    pub docs_per_second: f64,
}

/// Summary of one decoded record.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordSummary {
    pub term: String,
    pub doc_frequency: u64,
    pub total_occurrences: u64,
    pub last_docno: u64,
    pub postings_bytes: usize,
    pub first_docno: Option<u64>,
}

/// Result structure for inspecting a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResult {
    pub path: String,
    pub total_records: usize,
    pub total_occurrences: u64,
    pub postings_bytes: u64,
    pub records: Vec<RecordSummary>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &FalchionArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &FalchionArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    // Convert to JSON value for easier manipulation
    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("InspectResult") => {
            output_inspect_result_human(&value, args)
        }
        _ => output_generic_human(&value, args),
    }
}

/// Output an inspected run in human format.
fn output_inspect_result_human(value: &serde_json::Value, args: &FalchionArgs) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return output_generic_human(value, args);
    };

    for key in ["path", "total_records", "total_occurrences", "postings_bytes"] {
        if let Some(val) = obj.get(key) {
            println!("{key}: {}", format_value(val));
        }
    }

    if let Some(records) = obj.get("records").and_then(|r| r.as_array())
        && !records.is_empty()
    {
        println!();
        println!("{:<24} {:>10} {:>12} {:>12} {:>10}", "term", "docs", "occurrences", "last docno", "bytes");
        println!("{}", "─".repeat(72));
        for record in records {
            let field = |name: &str| record.get(name).map(format_value).unwrap_or_default();
            println!(
                "{:<24} {:>10} {:>12} {:>12} {:>10}",
                field("term"),
                field("doc_frequency"),
                field("total_occurrences"),
                field("last_docno"),
                field("postings_bytes")
            );
        }
    }
    Ok(())
}

fn output_generic_human(value: &serde_json::Value, _args: &FalchionArgs) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &FalchionArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for human output.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("fox")), "fox");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(["a", 1])), "[a, 1]");
        assert_eq!(format_value(&json!(null)), "null");
    }

    #[test]
    fn test_build_result_flattens_summary() {
        let result = BuildResult {
            summary: IndexSummary {
                documents: 3,
                runs: 1,
                ..Default::default()
            },
            inputs: 1,
            duration_ms: 5,
            docs_per_second: 600.0,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["documents"], 3);
        assert_eq!(value["runs"], 1);
        assert_eq!(value["inputs"], 1);
    }
}
