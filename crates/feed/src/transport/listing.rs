//! Directory index parsing.
//!
//! The feed host serves an nginx-style JSON autoindex:
//! `[{"name": "...", "type": "file", "mtime": "<RFC 2822>", "size": n}]`.
//! Directories are skipped; only files are candidates for ingestion.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{FeedEntry, TransportError};

#[derive(Debug, Deserialize)]
struct IndexRecord {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    mtime: String,
    #[serde(default)]
    size: Option<u64>,
}

/// Decode a directory index into entries sorted newest-first.
///
/// Ties on the modification timestamp resolve to the lexically greater
/// name, keeping the selection deterministic.
pub fn parse_listing(bytes: &[u8]) -> Result<Vec<FeedEntry>, TransportError> {
    let records: Vec<IndexRecord> =
        serde_json::from_slice(bytes).map_err(|e| TransportError::Listing(e.to_string()))?;

    let mut entries = records
        .into_iter()
        .filter(|record| record.kind == "file")
        .map(|record| {
            let modified_at = DateTime::parse_from_rfc2822(&record.mtime)
                .map_err(|e| TransportError::Listing(format!("bad mtime {:?}: {e}", record.mtime)))?
                .with_timezone(&Utc);
            Ok(FeedEntry { name: record.name, modified_at, size: record.size })
        })
        .collect::<Result<Vec<_>, TransportError>>()?;

    entries.sort_by(|a, b| {
        b.modified_at
            .cmp(&a.modified_at)
            .then_with(|| b.name.cmp(&a.name))
    });
    Ok(entries)
}
