use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::error::{DatasetError, DatasetResult};

/// List the identifiers of every `*.{extension}` file directly inside `dir`.
///
/// The identifier is the file name with the extension removed. The
/// extension must match exactly, so `a.PNG` is skipped when listing `png`:
/// callers rebuild file names as `{identifier}.{extension}`. Entries with
/// another extension (or none) are skipped, as are file names that are not
/// valid UTF-8. The directory is not traversed recursively.
///
/// The order is whatever `fs::read_dir` yields; sort the result if a stable
/// order matters.
pub fn list_identifiers(dir: &Path, extension: &str) -> DatasetResult<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|source| {
        error!("Failed to read directory {:?}: {}", dir, source);
        DatasetError::DirectoryNotFound {
            path: dir.to_path_buf(),
            source,
        }
    })?;

    let mut identifiers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            error!("Failed to read an entry of {:?}: {}", dir, source);
            DatasetError::Io {
                path: dir.to_path_buf(),
                source,
            }
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            debug!("Skipping {:?}: extension is not .{}", path, extension);
            continue;
        }
        match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => identifiers.push(stem.to_string()),
            None => warn!("Skipping {:?}: file name is not valid UTF-8", path),
        }
    }

    info!("Found {} identifiers in {:?}", identifiers.len(), dir);
    Ok(identifiers)
}
