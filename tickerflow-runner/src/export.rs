//! Output artifacts: symbol CSVs and the JSON run summary.
//!
//! Symbol CSVs carry a single `symbol` column so they can be fed straight
//! back into `ingest-daily`. Summaries include a `schema_version` field and
//! unknown versions are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::summary::{RunSummary, SCHEMA_VERSION};

// ─── CSV export ─────────────────────────────────────────────────────

/// Render symbols as a one-column CSV with a `symbol` header.
pub fn symbol_csv<S: AsRef<str>>(symbols: &[S]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["symbol"])?;
    for symbol in symbols {
        wtr.write_record([symbol.as_ref()])?;
    }
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Write symbols to `path`, replacing any existing file.
pub fn write_symbol_csv<S: AsRef<str>>(path: &Path, symbols: &[S]) -> Result<()> {
    let csv = symbol_csv(symbols)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunSummary` to pretty JSON.
pub fn export_summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize RunSummary to JSON")
}

/// Deserialize a `RunSummary`, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<RunSummary> {
    let summary: RunSummary =
        serde_json::from_str(json).context("failed to deserialize RunSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

/// Write a summary as pretty JSON to `path`.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = export_summary_json(summary)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}
