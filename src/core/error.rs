//! Error types shared by every stage of the corpus preparation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("directory not found or unreadable: {path}: {source}")]
    DirectoryNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read metadata table {path}: {msg}")]
    MetadataRead { path: PathBuf, msg: String },
    #[error("failed to read split table {path}: {msg}")]
    SplitTableRead { path: PathBuf, msg: String },
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("image decode error at {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    #[error("unexpected batch shape: {0}")]
    BatchShape(String),
    #[error("test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),
    #[error("invalid configuration {path}: {msg}")]
    Config { path: PathBuf, msg: String },
    #[error("failed to write {test_path} ({persist}) and could not remove {train_path}: {source}")]
    PartialOutput {
        test_path: PathBuf,
        persist: std::io::Error,
        train_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
