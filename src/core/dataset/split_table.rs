use std::path::Path;
use tracing::{error, info};

use crate::core::error::{DatasetError, DatasetResult};

/// Name of the label column in every split table.
pub const LABEL_COLUMN: &str = "Label";

/// One row of a train or test table: a loadable file name and its label.
///
/// `label` is `None` for identifiers that only exist in the metadata table
/// and therefore never received an attribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SplitRecord {
    pub filename: String,
    pub label: Option<u8>,
}

impl SplitRecord {
    pub fn new(filename: impl Into<String>, label: Option<u8>) -> Self {
        Self {
            filename: filename.into(),
            label,
        }
    }

    /// Label as written to the table: `0`, `1`, or an empty cell.
    pub fn label_cell(&self) -> String {
        self.label.map(|l| l.to_string()).unwrap_or_default()
    }
}

/// Parse a label cell. Accepts integer (`1`) and float (`1.0`) spellings.
fn parse_label_cell(cell: &str) -> Option<Option<u8>> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v == 0.0 => Some(Some(0)),
        Ok(v) if v == 1.0 => Some(Some(1)),
        _ => None,
    }
}

/// Read a split table. The first column is the file name and the second the
/// label, whatever the header calls them.
pub fn read_split_table(path: &Path) -> DatasetResult<Vec<SplitRecord>> {
    let table_error = |msg: String| {
        error!("Failed to read split table {:?}: {}", path, msg);
        DatasetError::SplitTableRead {
            path: path.to_path_buf(),
            msg,
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| table_error(e.to_string()))?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| table_error(e.to_string()))?;
        let filename = record
            .get(0)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| table_error(format!("row {} has no file name", row + 1)))?;
        let cell = record.get(1).unwrap_or("");
        let label = parse_label_cell(cell)
            .ok_or_else(|| table_error(format!("row {} has invalid label {:?}", row + 1, cell)))?;
        records.push(SplitRecord::new(filename, label));
    }

    info!("Loaded {} records from split table {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_split_table_with_missing_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train_data.csv");
        fs::write(&path, "identifiant,Label\n1.png,0\n2.png,1\n9.png,\n").unwrap();

        let records = read_split_table(&path).unwrap();

        assert_eq!(
            records,
            vec![
                SplitRecord::new("1.png", Some(0)),
                SplitRecord::new("2.png", Some(1)),
                SplitRecord::new("9.png", None),
            ]
        );
    }

    #[test]
    fn test_read_split_table_accepts_float_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_data.csv");
        fs::write(&path, "id,Label\na.png,1.0\nb.png,0.0\n").unwrap();

        let records = read_split_table(&path).unwrap();
        assert_eq!(records[0].label, Some(1));
        assert_eq!(records[1].label, Some(0));
    }

    #[test]
    fn test_read_split_table_rejects_bad_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,Label\na.png,7\n").unwrap();

        let err = read_split_table(&path).unwrap_err();
        assert!(matches!(err, DatasetError::SplitTableRead { .. }));
    }

    #[test]
    fn test_read_split_table_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_split_table(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::SplitTableRead { .. }));
    }

    #[test]
    fn test_label_cell() {
        assert_eq!(SplitRecord::new("a.png", Some(1)).label_cell(), "1");
        assert_eq!(SplitRecord::new("a.png", None).label_cell(), "");
    }
}
