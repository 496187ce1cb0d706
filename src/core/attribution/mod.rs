//! Label attribution and train/test table generation.
//!
//! A run enumerates the image and mask directories of both imagery sources,
//! labels every image identifier by mask presence, applies the source
//! selection, joins the result with the metadata table and writes a seeded
//! train/test split.

mod export;
mod metadata;
mod split;
mod table;

pub use export::{write_split_tables, SplitFiles, TEST_FILE_NAME, TRAIN_FILE_NAME};
pub use metadata::{outer_join, JoinedRow, MetadataTable};
pub use split::{test_count, train_test_split};
pub use table::{attribute_labels, AttributionRow, SourceListings, SourceSelection};

use std::path::PathBuf;
use tracing::{info, info_span};

use crate::config::AttributionConfig;
use crate::core::dataset::SplitRecord;
use crate::core::error::DatasetResult;
use crate::core::listing::list_identifiers;

/// Row counts and output paths of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionReport {
    pub attributed_rows: usize,
    pub positive_rows: usize,
    pub metadata_rows: usize,
    pub joined_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
}

/// One-shot attribution run over a validated [`AttributionConfig`].
#[derive(Debug, Clone)]
pub struct LabelAttribution {
    config: AttributionConfig,
}

impl LabelAttribution {
    pub fn new(config: AttributionConfig) -> DatasetResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Validate a borrowed config and clone it into a new engine.
    pub fn from_config(config: &AttributionConfig) -> DatasetResult<Self> {
        Self::new(config.clone())
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Enumerate the four directories.
    pub fn read_listings(&self) -> DatasetResult<SourceListings> {
        let ext = self.config.extension();
        Ok(SourceListings {
            source_a_images: list_identifiers(&self.config.source_a_images_dir, ext)?,
            source_a_masks: list_identifiers(&self.config.source_a_masks_dir, ext)?,
            source_b_images: list_identifiers(&self.config.source_b_images_dir, ext)?,
            source_b_masks: list_identifiers(&self.config.source_b_masks_dir, ext)?,
        })
    }

    /// The deduplicated attribution table, before the metadata join.
    pub fn attribution_table(&self) -> DatasetResult<Vec<AttributionRow>> {
        let listings = self.read_listings()?;
        Ok(attribute_labels(&listings, self.config.selection()))
    }

    fn read_metadata(&self) -> DatasetResult<MetadataTable> {
        MetadataTable::read(&self.config.metadata_path, &self.config.identifier_column)
    }

    fn join(&self, metadata: &MetadataTable, rows: &[AttributionRow]) -> Vec<SplitRecord> {
        let ext = self.config.extension();
        outer_join(metadata, rows)
            .into_iter()
            .map(|row| SplitRecord::new(format!("{}.{}", row.identifier, ext), row.label))
            .collect()
    }

    /// Joined `(file name, label)` rows, before the split.
    pub fn split_records(&self) -> DatasetResult<Vec<SplitRecord>> {
        let rows = self.attribution_table()?;
        let metadata = self.read_metadata()?;
        Ok(self.join(&metadata, &rows))
    }

    /// Run the whole pipeline and write both split tables.
    ///
    /// Either both output files are written or neither is.
    pub fn run(&self) -> DatasetResult<AttributionReport> {
        let span = info_span!("attribution_run");
        let _guard = span.enter();

        info!(
            "Starting attribution: selection={}, test_fraction={}, seed={}",
            self.config.selection().as_str(),
            self.config.test_fraction,
            self.config.random_seed
        );

        let rows = self.attribution_table()?;
        let metadata = self.read_metadata()?;
        let records = self.join(&metadata, &rows);
        let joined_rows = records.len();
        let (train, test) =
            train_test_split(records, self.config.test_fraction, self.config.random_seed)?;
        let files = write_split_tables(
            &self.config.output_dir,
            &self.config.identifier_column,
            &train,
            &test,
        )?;

        let report = AttributionReport {
            attributed_rows: rows.len(),
            positive_rows: rows.iter().filter(|r| r.label == 1).count(),
            metadata_rows: metadata.len(),
            joined_rows,
            train_rows: train.len(),
            test_rows: test.len(),
            train_path: files.train_path,
            test_path: files.test_path,
        };
        info!("Attribution complete: {:?}", report);
        Ok(report)
    }
}

/// Run an attribution described by `config`.
pub fn attribute_and_split(config: &AttributionConfig) -> DatasetResult<AttributionReport> {
    LabelAttribution::from_config(config)?.run()
}
