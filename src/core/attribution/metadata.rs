use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::table::AttributionRow;
use crate::core::error::{DatasetError, DatasetResult};

/// The identifier column of the externally supplied metadata table.
///
/// Other columns are read but not kept.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    path: PathBuf,
    identifiers: Vec<String>,
}

impl MetadataTable {
    /// Read `identifier_column` from the delimited file at `path`.
    ///
    /// Rows whose identifier cell is empty (after trimming) are dropped with
    /// a warning, so they never reach [`outer_join`] and produce no output
    /// row. [`len`](Self::len) counts only the kept rows.
    pub fn read(path: &Path, identifier_column: &str) -> DatasetResult<Self> {
        let metadata_error = |msg: String| {
            error!("Failed to read metadata {:?}: {}", path, msg);
            DatasetError::MetadataRead {
                path: path.to_path_buf(),
                msg,
            }
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| metadata_error(e.to_string()))?;

        let headers = reader
            .headers()
            .map_err(|e| metadata_error(e.to_string()))?
            .clone();
        let column = headers
            .iter()
            .position(|h| h.trim() == identifier_column)
            .ok_or_else(|| metadata_error(format!("missing identifier column {:?}", identifier_column)))?;

        let mut identifiers = Vec::new();
        let mut blank = 0usize;
        for result in reader.records() {
            let record = result.map_err(|e| metadata_error(e.to_string()))?;
            match record.get(column).map(str::trim) {
                Some(id) if !id.is_empty() => identifiers.push(id.to_string()),
                _ => blank += 1,
            }
        }

        if blank > 0 {
            warn!("Skipped {} metadata rows with an empty {:?}", blank, identifier_column);
        }
        info!("Loaded {} metadata rows from {:?}", identifiers.len(), path);

        Ok(Self {
            path: path.to_path_buf(),
            identifiers,
        })
    }

    pub fn from_identifiers(identifiers: Vec<String>) -> Self {
        Self {
            path: PathBuf::new(),
            identifiers,
        }
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A row of the joined table, before the extension is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub identifier: String,
    pub label: Option<u8>,
}

/// Full outer join of the metadata table and the attribution table on the
/// identifier, sorted by identifier.
///
/// An identifier repeated in the metadata yields one row per metadata row.
/// Metadata-only identifiers get no label; attribution-only identifiers are
/// kept with their label.
pub fn outer_join(metadata: &MetadataTable, rows: &[AttributionRow]) -> Vec<JoinedRow> {
    // identifier -> (metadata occurrences, attributed label)
    let mut keys: BTreeMap<&str, (usize, Option<u8>)> = BTreeMap::new();
    for id in metadata.identifiers() {
        keys.entry(id.as_str()).or_default().0 += 1;
    }
    for row in rows {
        keys.entry(row.identifier.as_str()).or_default().1 = Some(row.label);
    }

    let repeated = keys.values().filter(|(count, _)| *count > 1).count();
    if repeated > 0 {
        warn!("{} identifiers appear more than once in the metadata table", repeated);
    }

    let mut joined = Vec::with_capacity(keys.len());
    let mut metadata_only = 0usize;
    let mut attribution_only = 0usize;
    for (id, (count, label)) in keys {
        match (count, label) {
            (0, _) => attribution_only += 1,
            (_, None) => metadata_only += 1,
            _ => {}
        }
        for _ in 0..count.max(1) {
            joined.push(JoinedRow {
                identifier: id.to_string(),
                label,
            });
        }
    }

    info!(
        "Outer join produced {} rows ({} metadata only, {} without metadata)",
        joined.len(),
        metadata_only,
        attribution_only
    );
    joined
}
