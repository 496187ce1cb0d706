use ndarray::{stack, Array3, Array4, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error};

use super::Dataset;
use crate::core::error::{DatasetError, DatasetResult};

/// Groups dataset records into `(B, C, H, W)` image batches.
///
/// Records are fetched sequentially on the calling thread. A failing record
/// fails its batch only; iteration goes on with the next batch.
#[derive(Debug, Clone)]
pub struct DataLoader<D> {
    dataset: D,
    batch_size: usize,
    shuffle_seed: Option<u64>,
    drop_last: bool,
}

impl<D> DataLoader<D>
where
    D: Dataset<Image = Array3<f32>>,
{
    /// Loader with batches of `batch_size` records (at least one) in table order.
    pub fn new(dataset: D, batch_size: usize) -> Self {
        Self {
            dataset,
            batch_size: batch_size.max(1),
            shuffle_seed: None,
            drop_last: false,
        }
    }

    /// Visit records in an order shuffled with `seed`.
    pub fn shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// Drop the last batch when it is smaller than `batch_size`.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    pub fn iter(&self) -> Batches<'_, D> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            order.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        Batches {
            dataset: &self.dataset,
            order,
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            cursor: 0,
        }
    }
}

impl<'a, D> IntoIterator for &'a DataLoader<D>
where
    D: Dataset<Image = Array3<f32>>,
{
    type Item = DatasetResult<(Array4<f32>, Vec<D::Label>)>;
    type IntoIter = Batches<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the batches of a [`DataLoader`].
pub struct Batches<'a, D> {
    dataset: &'a D,
    order: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    cursor: usize,
}

impl<'a, D> Batches<'a, D>
where
    D: Dataset<Image = Array3<f32>>,
{
    fn load(&self, indices: &[usize]) -> DatasetResult<(Array4<f32>, Vec<D::Label>)> {
        let mut images: Vec<Array3<f32>> = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &index in indices {
            let (image, label) = self.dataset.get(index)?;
            if let Some(first) = images.first() {
                if first.dim() != image.dim() {
                    let msg = format!(
                        "record {} has shape {:?}, batch started with {:?}",
                        index,
                        image.dim(),
                        first.dim()
                    );
                    error!("Cannot batch records: {}", msg);
                    return Err(DatasetError::BatchShape(msg));
                }
            }
            images.push(image);
            labels.push(label);
        }

        let views: Vec<ArrayView3<f32>> = images.iter().map(|i| i.view()).collect();
        let batch = stack(Axis(0), &views).map_err(|e| {
            error!("Failed to stack batch: {}", e);
            DatasetError::BatchShape(e.to_string())
        })?;
        debug!("Loaded batch of {} records", indices.len());
        Ok((batch, labels))
    }
}

impl<'a, D> Iterator for Batches<'a, D>
where
    D: Dataset<Image = Array3<f32>>,
{
    type Item = DatasetResult<(Array4<f32>, Vec<D::Label>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.order.len().saturating_sub(self.cursor);
        if remaining == 0 || (self.drop_last && remaining < self.batch_size) {
            return None;
        }
        let end = self.cursor + remaining.min(self.batch_size);
        let indices = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        Some(self.load(&indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stats::streaming_stats;
    use ndarray::Array;

    /// In-memory dataset of constant images, record `i` filled with `i`.
    struct Constant {
        shapes: Vec<(usize, usize, usize)>,
    }

    impl Dataset for Constant {
        type Image = Array3<f32>;
        type Label = usize;

        fn len(&self) -> usize {
            self.shapes.len()
        }

        fn get(&self, index: usize) -> DatasetResult<(Array3<f32>, usize)> {
            let shape = *self.shapes.get(index).ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.shapes.len(),
            })?;
            Ok((Array::from_elem(shape, index as f32), index))
        }
    }

    fn uniform(n: usize) -> Constant {
        Constant {
            shapes: vec![(3, 2, 2); n],
        }
    }

    #[test]
    fn test_batches_in_order() {
        let loader = DataLoader::new(uniform(5), 2);
        assert_eq!(loader.num_batches(), 3);

        let batches: Vec<_> = loader.iter().map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].0.shape(), &[2, 3, 2, 2]);
        assert_eq!(batches[0].1, vec![0, 1]);
        assert_eq!(batches[2].0.shape(), &[1, 3, 2, 2]);
        assert_eq!(batches[2].1, vec![4]);
        assert_eq!(batches[1].0[[1, 0, 0, 0]], 3.0);
    }

    #[test]
    fn test_drop_last() {
        let loader = DataLoader::new(uniform(5), 2).drop_last(true);
        assert_eq!(loader.num_batches(), 2);
        assert_eq!(loader.iter().count(), 2);
    }

    #[test]
    fn test_shuffle_is_seeded_permutation() {
        let collect = |seed| {
            DataLoader::new(uniform(10), 3)
                .shuffle(seed)
                .iter()
                .flat_map(|b| b.unwrap().1)
                .collect::<Vec<_>>()
        };
        let first = collect(11);
        assert_eq!(first, collect(11));

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_mismatched_shapes_fail_that_batch_only() {
        let dataset = Constant {
            shapes: vec![(3, 2, 2), (3, 4, 4), (3, 2, 2), (3, 2, 2)],
        };
        let results: Vec<_> = DataLoader::new(dataset, 2).iter().collect();

        assert!(matches!(results[0], Err(DatasetError::BatchShape(_))));
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_loader_feeds_streaming_stats() {
        let loader = DataLoader::new(uniform(4), 3);
        let stats = streaming_stats(&loader).unwrap();

        // values 0, 1, 2, 3 in equal amounts
        for c in 0..3 {
            assert!((stats.mean[c] - 1.5).abs() < 1e-6);
            assert!((stats.std[c] - 1.25f32.sqrt()).abs() < 1e-6);
        }
    }
}
