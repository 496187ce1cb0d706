//! Training-corpus preparation for rooftop photovoltaic segmentation.
//!
//! Two imagery providers each supply an image directory and a mask
//! directory. [`LabelAttribution`] labels every image by mask presence,
//! reconciles the result with a metadata table and writes seeded
//! `train_data.csv` / `test_data.csv` tables. [`ImageLabelDataset`] then
//! loads `(image, label)` pairs from those tables on demand, and the
//! [`crate::core::stats`] and [`crate::core::flip`] helpers cover normalization statistics
//! and mirror augmentation.
//!
//! The library never installs a tracing subscriber on its own; call
//! [`logging::setup_logging`] (or install your own) to see its logs.

pub mod config;
pub mod core;
pub mod logging;

pub use config::AttributionConfig;
pub use crate::core::{
    attribute_and_split, AttributionReport, DataLoader, Dataset, DatasetError, DatasetResult,
    ImageLabelDataset, LabelAttribution, SourceSelection, SplitRecord,
};
