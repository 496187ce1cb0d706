//! Per-channel normalization statistics over batches of `(B, C, H, W)` images.
//!
//! `single_batch_stats` is a quick estimate from the first batch only.
//! `streaming_stats` walks the whole source once, keeping running first and
//! second raw moments per channel, so memory depends on the channel count
//! and not on the dataset size.

use ndarray::{Array1, Array4, Axis};
use tracing::{debug, error, info, warn};

use super::error::{DatasetError, DatasetResult};

/// Per-channel mean and standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    pub mean: Array1<f32>,
    pub std: Array1<f32>,
}

impl ChannelStats {
    pub fn channels(&self) -> usize {
        self.mean.len()
    }
}

/// Pixels per channel and per-channel `(sum, sum of squares)` of a batch.
fn channel_sums(images: &Array4<f32>) -> (usize, Vec<(f64, f64)>) {
    let (batch, _, height, width) = images.dim();
    let sums = images
        .axis_iter(Axis(1))
        .map(|channel| {
            channel.iter().fold((0.0f64, 0.0f64), |(s, sq), &v| {
                let v = f64::from(v);
                (s + v, sq + v * v)
            })
        })
        .collect();
    (batch * height * width, sums)
}

/// Mean and unbiased standard deviation of the first batch in `source`.
pub fn single_batch_stats<I, L, E>(source: I) -> DatasetResult<ChannelStats>
where
    I: IntoIterator<Item = Result<(Array4<f32>, L), E>>,
    DatasetError: From<E>,
{
    let (images, _) = source
        .into_iter()
        .next()
        .ok_or_else(|| {
            warn!("Single batch stats requested over an empty source");
            DatasetError::DegenerateInput("source yielded no batches".to_string())
        })??;

    let (pixels, sums) = channel_sums(&images);
    if pixels < 2 {
        let msg = format!("batch has {} pixels per channel, need at least 2", pixels);
        warn!("Cannot estimate stats: {}", msg);
        return Err(DatasetError::DegenerateInput(msg));
    }

    let n = pixels as f64;
    let mut mean = Vec::with_capacity(sums.len());
    let mut std = Vec::with_capacity(sums.len());
    for (channel, (sum, _)) in images.axis_iter(Axis(1)).zip(&sums) {
        let m = sum / n;
        let squared_dev: f64 = channel
            .iter()
            .map(|&v| {
                let d = f64::from(v) - m;
                d * d
            })
            .sum();
        mean.push(m as f32);
        std.push((squared_dev / (n - 1.0)).sqrt() as f32);
    }

    debug!("Single batch stats over {} pixels per channel", pixels);
    Ok(ChannelStats {
        mean: Array1::from(mean),
        std: Array1::from(std),
    })
}

/// Running raw moments, updated one batch at a time.
#[derive(Debug, Clone, Default)]
pub struct RunningMoments {
    count: usize,
    first: Vec<f64>,
    second: Vec<f64>,
}

impl RunningMoments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pixels per channel seen so far
    pub fn count(&self) -> usize {
        self.count
    }

    /// Fold one batch into the moments. Batches without pixels are ignored.
    pub fn update(&mut self, images: &Array4<f32>) -> DatasetResult<()> {
        let (pixels, sums) = channel_sums(images);
        if self.first.is_empty() && self.count == 0 {
            self.first = vec![0.0; sums.len()];
            self.second = vec![0.0; sums.len()];
        } else if sums.len() != self.first.len() {
            let msg = format!("expected {} channels, got {}", self.first.len(), sums.len());
            error!("Channel mismatch in streaming stats: {}", msg);
            return Err(DatasetError::BatchShape(msg));
        }
        if pixels == 0 {
            debug!("Skipping batch without pixels");
            return Ok(());
        }

        let count = self.count as f64;
        let total = (self.count + pixels) as f64;
        for (c, (sum, sum_sq)) in sums.into_iter().enumerate() {
            self.first[c] = (count * self.first[c] + sum) / total;
            self.second[c] = (count * self.second[c] + sum_sq) / total;
        }
        self.count += pixels;
        Ok(())
    }

    /// Mean and population standard deviation of everything seen.
    pub fn finish(&self) -> DatasetResult<ChannelStats> {
        if self.count == 0 {
            return Err(DatasetError::DegenerateInput(
                "no pixels seen in source".to_string(),
            ));
        }
        let mean: Array1<f32> = self.first.iter().map(|&m| m as f32).collect();
        let std: Array1<f32> = self
            .first
            .iter()
            .zip(&self.second)
            .map(|(&m1, &m2)| (m2 - m1 * m1).max(0.0).sqrt() as f32)
            .collect();
        Ok(ChannelStats { mean, std })
    }
}

/// Mean and standard deviation over every batch in `source`, in one pass.
pub fn streaming_stats<I, L, E>(source: I) -> DatasetResult<ChannelStats>
where
    I: IntoIterator<Item = Result<(Array4<f32>, L), E>>,
    DatasetError: From<E>,
{
    let mut moments = RunningMoments::new();
    let mut batches = 0usize;
    for item in source {
        let (images, _) = item?;
        moments.update(&images)?;
        batches += 1;
    }

    if moments.count() == 0 {
        warn!("Streaming stats requested over an empty source ({} batches)", batches);
    }
    let stats = moments.finish()?;
    info!(
        "Streaming stats over {} batches / {} pixels per channel: mean={:?} std={:?}",
        batches,
        moments.count(),
        stats.mean.to_vec(),
        stats.std.to_vec()
    );
    Ok(stats)
}
