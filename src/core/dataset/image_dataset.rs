use image::imageops::{self, FilterType};
use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

use super::split_table::{read_split_table, SplitRecord};
use super::Dataset;
use crate::core::error::{DatasetError, DatasetResult};

type ImageFn<I> = Arc<dyn Fn(RgbImage) -> I + Send + Sync>;
type LabelFn<L> = Arc<dyn Fn(Option<u8>) -> L + Send + Sync>;

/// Lazily loaded `(image, label)` pairs described by a split table.
///
/// The configuration is fixed once built; every `get` decodes the image
/// again from disk. Without transforms the image is the decoded RGB image
/// and the label the raw table value.
///
/// ```rust,ignore
/// let train = ImageLabelDataset::open(Path::new("out/train_data.csv"), "images/")?
///     .with_resize(256, 256)
///     .with_transform(|img| to_chw_tensor(&img))
///     .with_target_transform(|label| label.unwrap_or(0) as f32);
/// ```
pub struct ImageLabelDataset<I = RgbImage, L = Option<u8>> {
    records: Arc<[SplitRecord]>,
    image_dir: PathBuf,
    resize: Option<(u32, u32)>,
    transform: ImageFn<I>,
    target_transform: LabelFn<L>,
}

impl ImageLabelDataset {
    /// Read the split table at `split_table` and resolve its file names
    /// against `image_dir`.
    pub fn open(split_table: &Path, image_dir: impl Into<PathBuf>) -> DatasetResult<Self> {
        let records = read_split_table(split_table)?;
        Ok(Self::from_records(records, image_dir))
    }

    pub fn from_records(records: Vec<SplitRecord>, image_dir: impl Into<PathBuf>) -> Self {
        Self {
            records: records.into(),
            image_dir: image_dir.into(),
            resize: None,
            transform: Arc::new(|image: RgbImage| image),
            target_transform: Arc::new(|label: Option<u8>| label),
        }
    }
}

impl<I, L> ImageLabelDataset<I, L> {
    /// Resize every image to exactly `width` x `height` before the transform.
    pub fn with_resize(mut self, width: u32, height: u32) -> Self {
        self.resize = Some((width, height));
        self
    }

    /// Replace the image transform.
    pub fn with_transform<J, F>(self, transform: F) -> ImageLabelDataset<J, L>
    where
        F: Fn(RgbImage) -> J + Send + Sync + 'static,
    {
        ImageLabelDataset {
            records: self.records,
            image_dir: self.image_dir,
            resize: self.resize,
            transform: Arc::new(transform),
            target_transform: self.target_transform,
        }
    }

    /// Replace the label transform.
    pub fn with_target_transform<M, F>(self, target_transform: F) -> ImageLabelDataset<I, M>
    where
        F: Fn(Option<u8>) -> M + Send + Sync + 'static,
    {
        ImageLabelDataset {
            records: self.records,
            image_dir: self.image_dir,
            resize: self.resize,
            transform: self.transform,
            target_transform: Arc::new(target_transform),
        }
    }

    pub fn records(&self) -> &[SplitRecord] {
        &self.records
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn resize(&self) -> Option<(u32, u32)> {
        self.resize
    }

    /// Path of record `index`'s image
    pub fn image_path(&self, index: usize) -> DatasetResult<PathBuf> {
        let record = self.record(index)?;
        Ok(self.image_dir.join(&record.filename))
    }

    fn record(&self, index: usize) -> DatasetResult<&SplitRecord> {
        self.records.get(index).ok_or(DatasetError::IndexOutOfRange {
            index,
            len: self.records.len(),
        })
    }

    fn decode(&self, path: &Path) -> DatasetResult<RgbImage> {
        let image = image::open(path).map_err(|source| {
            error!("Failed to decode image {:?}: {}", path, source);
            DatasetError::ImageDecode {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let rgb = image.to_rgb8();
        Ok(match self.resize {
            Some((width, height)) if rgb.dimensions() != (width, height) => {
                imageops::resize(&rgb, width, height, FilterType::CatmullRom)
            }
            _ => rgb,
        })
    }
}

impl<I, L> Dataset for ImageLabelDataset<I, L> {
    type Image = I;
    type Label = L;

    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> DatasetResult<(I, L)> {
        let record = self.record(index)?;
        let path = self.image_dir.join(&record.filename);
        debug!("Loading record {} from {:?}", index, path);

        let image = self.decode(&path)?;
        Ok(((self.transform)(image), (self.target_transform)(record.label)))
    }
}

impl<I, L> Clone for ImageLabelDataset<I, L> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            image_dir: self.image_dir.clone(),
            resize: self.resize,
            transform: Arc::clone(&self.transform),
            target_transform: Arc::clone(&self.target_transform),
        }
    }
}

impl<I, L> fmt::Debug for ImageLabelDataset<I, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLabelDataset")
            .field("records", &self.records.len())
            .field("image_dir", &self.image_dir)
            .field("resize", &self.resize)
            .finish_non_exhaustive()
    }
}
