use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::core::attribution::SourceSelection;
use crate::core::error::{DatasetError, DatasetResult};

fn default_true() -> bool {
    true
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_image_extension() -> String {
    "png".to_string()
}

/// Everything one attribution run needs, loadable from a JSON file.
///
/// Only the paths and the identifier column are required in the file; the
/// remaining fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionConfig {
    pub source_a_images_dir: PathBuf,
    pub source_a_masks_dir: PathBuf,
    pub source_b_images_dir: PathBuf,
    pub source_b_masks_dir: PathBuf,

    /// Delimited metadata table with a header row
    pub metadata_path: PathBuf,

    /// Column shared by the metadata table and the image file names
    pub identifier_column: String,

    /// Where `train_data.csv` and `test_data.csv` are written
    pub output_dir: PathBuf,

    #[serde(default = "default_true")]
    pub use_source_a: bool,

    #[serde(default)]
    pub use_source_b: bool,

    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    #[serde(default)]
    pub random_seed: u64,

    /// Image extension without the leading dot
    #[serde(default = "default_image_extension")]
    pub image_extension: String,

    /// Optional directory for a log file, used by the binary
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl AttributionConfig {
    /// Config with the given directories and the default run parameters.
    pub fn new(
        source_a_images_dir: impl Into<PathBuf>,
        source_a_masks_dir: impl Into<PathBuf>,
        source_b_images_dir: impl Into<PathBuf>,
        source_b_masks_dir: impl Into<PathBuf>,
        metadata_path: impl Into<PathBuf>,
        identifier_column: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_a_images_dir: source_a_images_dir.into(),
            source_a_masks_dir: source_a_masks_dir.into(),
            source_b_images_dir: source_b_images_dir.into(),
            source_b_masks_dir: source_b_masks_dir.into(),
            metadata_path: metadata_path.into(),
            identifier_column: identifier_column.into(),
            output_dir: output_dir.into(),
            use_source_a: true,
            use_source_b: false,
            test_fraction: default_test_fraction(),
            random_seed: 0,
            image_extension: default_image_extension(),
            log_dir: None,
        }
    }

    pub fn with_sources(mut self, use_source_a: bool, use_source_b: bool) -> Self {
        self.use_source_a = use_source_a;
        self.use_source_b = use_source_b;
        self
    }

    pub fn with_split(mut self, test_fraction: f64, random_seed: u64) -> Self {
        self.test_fraction = test_fraction;
        self.random_seed = random_seed;
        self
    }

    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    pub fn selection(&self) -> SourceSelection {
        SourceSelection::from_flags(self.use_source_a, self.use_source_b)
    }

    /// Extension with any leading dot removed
    pub fn extension(&self) -> &str {
        self.image_extension.trim_start_matches('.')
    }

    /// Check the values a run would otherwise fail on halfway.
    pub fn validate(&self) -> DatasetResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            error!("Invalid config: test_fraction {} is outside (0, 1)", self.test_fraction);
            return Err(DatasetError::InvalidTestFraction(self.test_fraction));
        }
        let invalid = |msg: &str| {
            error!("Invalid config: {}", msg);
            DatasetError::Config {
                path: PathBuf::new(),
                msg: msg.to_string(),
            }
        };
        if self.identifier_column.trim().is_empty() {
            return Err(invalid("identifier_column must not be empty"));
        }
        if self.extension().is_empty() {
            return Err(invalid("image_extension must not be empty"));
        }
        Ok(())
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        info!("Loading attribution config from: {:?}", path);
        let config_error = |msg: String| {
            error!("Invalid config {:?}: {}", path, msg);
            DatasetError::Config {
                path: path.to_path_buf(),
                msg,
            }
        };

        let contents = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        let config: AttributionConfig =
            serde_json::from_str(&contents).map_err(|e| config_error(e.to_string()))?;
        config.validate().map_err(|e| match e {
            DatasetError::Config { msg, .. } => config_error(msg),
            other => other,
        })?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> DatasetResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| DatasetError::Config {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        fs::write(path, json).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Attribution config saved to: {:?}", path);
        Ok(())
    }
}
