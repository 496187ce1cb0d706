mod image_dataset;
mod loader;
mod split_table;

pub use image_dataset::ImageLabelDataset;
pub use loader::{Batches, DataLoader};
pub use split_table::{read_split_table, SplitRecord, LABEL_COLUMN};

use crate::core::error::DatasetResult;

/// Indexed, random-access source of `(image, label)` records.
///
/// `get` takes `&self` and keeps no state between calls, so one dataset can
/// serve several loader workers at once.
pub trait Dataset: Send + Sync {
    type Image;
    type Label;

    /// Number of records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load record `index`. Fails with `IndexOutOfRange` past the end.
    fn get(&self, index: usize) -> DatasetResult<(Self::Image, Self::Label)>;
}
