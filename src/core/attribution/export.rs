use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::core::dataset::{SplitRecord, LABEL_COLUMN};
use crate::core::error::{DatasetError, DatasetResult};

pub const TRAIN_FILE_NAME: &str = "train_data.csv";
pub const TEST_FILE_NAME: &str = "test_data.csv";

/// Paths of the two persisted split tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFiles {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

fn io_error(path: &Path, source: io::Error) -> DatasetError {
    error!("I/O error at {:?}: {}", path, source);
    DatasetError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write one table into a temporary file inside `dir`.
fn write_table(
    dir: &Path,
    identifier_column: &str,
    records: &[SplitRecord],
) -> DatasetResult<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(dir, e))?;
    {
        let mut writer = csv::Writer::from_writer(file.as_file_mut());
        let write_err = |e: csv::Error| io_error(dir, io::Error::from(e));
        writer
            .write_record([identifier_column, LABEL_COLUMN])
            .map_err(write_err)?;
        for record in records {
            writer
                .write_record([record.filename.as_str(), record.label_cell().as_str()])
                .map_err(write_err)?;
        }
        writer.flush().map_err(|e| io_error(dir, e))?;
    }
    file.as_file_mut().sync_all().map_err(|e| io_error(dir, e))?;
    Ok(file)
}

/// Remove the already persisted train table after the test table failed.
fn roll_back(train_path: &Path, test_path: &Path, persist: io::Error) -> DatasetError {
    match fs::remove_file(train_path) {
        Ok(()) => io_error(test_path, persist),
        Err(source) => {
            error!(
                "Failed to write {:?} ({}) and failed to remove {:?}: {}",
                test_path, persist, train_path, source
            );
            DatasetError::PartialOutput {
                test_path: test_path.to_path_buf(),
                persist,
                train_path: train_path.to_path_buf(),
                source,
            }
        }
    }
}

/// Write the train and test tables to `output_dir`.
///
/// Both tables are staged as temporary files first; the final files only
/// appear once both are fully written. If the second rename fails the first
/// file is removed again; if that removal fails too the error is
/// [`DatasetError::PartialOutput`], naming the file left behind.
pub fn write_split_tables(
    output_dir: &Path,
    identifier_column: &str,
    train: &[SplitRecord],
    test: &[SplitRecord],
) -> DatasetResult<SplitFiles> {
    fs::create_dir_all(output_dir).map_err(|e| io_error(output_dir, e))?;

    let train_tmp = write_table(output_dir, identifier_column, train)?;
    let test_tmp = write_table(output_dir, identifier_column, test)?;

    let train_path = output_dir.join(TRAIN_FILE_NAME);
    let test_path = output_dir.join(TEST_FILE_NAME);

    train_tmp
        .persist(&train_path)
        .map_err(|e| io_error(&train_path, e.error))?;
    if let Err(e) = test_tmp.persist(&test_path) {
        return Err(roll_back(&train_path, &test_path, e.error));
    }

    info!(
        "Wrote {} train rows to {:?} and {} test rows to {:?}",
        train.len(),
        train_path,
        test.len(),
        test_path
    );

    Ok(SplitFiles {
        train_path,
        test_path,
    })
}
