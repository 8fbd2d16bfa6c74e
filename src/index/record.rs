//! Snapshot records and decoding of raw index responses.

use super::IndexError;

/// Field names the index echoes back as its first row.
const HEADER_ROW: [&str; 2] = ["timestamp", "original"];

/// One (timestamp, original URL) pair listed by the snapshot index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    /// Archive timestamp (`YYYYMMDDhhmmss`), lexicographically sortable.
    pub timestamp: String,
    /// URL as originally captured.
    pub original_url: String,
}

impl SnapshotRecord {
    /// Creates a record.
    pub fn new(timestamp: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            original_url: original_url.into(),
        }
    }
}

/// Decodes an index response body into records.
///
/// The body is a JSON array of string arrays. A leading header row is dropped
/// and a whitespace-only body is an empty page.
pub(crate) fn parse_rows(body: &str, query: &str) -> Result<Vec<SnapshotRecord>, IndexError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<Vec<String>> =
        serde_json::from_str(body).map_err(|e| IndexError::parse(query, e.to_string()))?;

    let skip = usize::from(rows.first().is_some_and(|row| is_header(row)));

    rows.into_iter()
        .enumerate()
        .skip(skip)
        .map(|(index, row)| {
            let mut fields = row.into_iter();
            match (fields.next(), fields.next()) {
                (Some(timestamp), Some(original_url)) => Ok(SnapshotRecord {
                    timestamp,
                    original_url,
                }),
                (first, _) => Err(IndexError::unexpected_shape(
                    query,
                    index,
                    format!("expected 2 fields, got {}", usize::from(first.is_some())),
                )),
            }
        })
        .collect()
}

fn is_header(row: &[String]) -> bool {
    row.len() == HEADER_ROW.len() && row.iter().zip(HEADER_ROW).all(|(field, name)| field == name)
}
