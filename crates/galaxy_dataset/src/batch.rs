//! Batch iteration for training and evaluation.

use crate::tasks::TaskSample;
use crate::types::{DatasetResult, GalaxyDatasetError};
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

pub(crate) const DEFAULT_LOG_EVERY_BATCHES: usize = 100;

pub struct BurnBatch<B: Backend> {
    /// Shape: [batch, 3, height, width].
    pub images: Tensor<B, 4>,
    /// One-hot targets, shape: [batch, classes].
    pub targets: Tensor<B, 2>,
    pub galaxy_ids: Tensor<B, 1, Int>,
}

/// Stack task samples into tensors. All samples must share image size and class count.
pub fn collate<B: Backend>(
    samples: &[TaskSample<'_>],
    device: &B::Device,
) -> DatasetResult<BurnBatch<B>> {
    let Some(first) = samples.first() else {
        return Err(GalaxyDatasetError::Other(
            "cannot collate empty batch".to_string(),
        ));
    };
    let (width, height) = (first.record.width, first.record.height);
    let classes = first.target.len();
    let batch = samples.len();

    let mut images_buf = Vec::with_capacity(batch * 3 * (width * height) as usize);
    let mut targets_buf = Vec::with_capacity(batch * classes);
    let mut ids_buf = Vec::with_capacity(batch);
    for sample in samples {
        let record = sample.record;
        if (record.width, record.height) != (width, height) {
            return Err(GalaxyDatasetError::Other(format!(
                "batch contains varying image sizes: galaxy {} is {}x{}, expected {}x{}",
                record.galaxy_id, record.width, record.height, width, height
            )));
        }
        if sample.target.len() != classes {
            return Err(GalaxyDatasetError::Other(format!(
                "batch mixes target widths: galaxy {} has {}, expected {}",
                record.galaxy_id,
                sample.target.len(),
                classes
            )));
        }
        images_buf.extend_from_slice(&record.image_chw);
        targets_buf.extend_from_slice(&sample.target);
        ids_buf.push(record.galaxy_id as i64);
    }

    let images = Tensor::<B, 1>::from_floats(images_buf.as_slice(), device).reshape([
        batch,
        3,
        height as usize,
        width as usize,
    ]);
    let targets =
        Tensor::<B, 1>::from_floats(targets_buf.as_slice(), device).reshape([batch, classes]);
    let galaxy_ids = Tensor::<B, 1, Int>::from_data(TensorData::new(ids_buf, [batch]), device);

    Ok(BurnBatch {
        images,
        targets,
        galaxy_ids,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub shuffle: bool,
    /// Seed for reproducible shuffling.
    pub seed: Option<u64>,
    /// Drop the last partial batch.
    pub drop_last: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            shuffle: true,
            seed: None,
            drop_last: false,
        }
    }
}

pub struct BatchIter<'a> {
    samples: Vec<TaskSample<'a>>,
    cursor: usize,
    cfg: BatchConfig,
    processed_batches: usize,
    processed_samples: usize,
}

impl<'a> BatchIter<'a> {
    pub fn new(mut samples: Vec<TaskSample<'a>>, cfg: BatchConfig) -> Self {
        if cfg.shuffle {
            let mut rng = match cfg.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_rng(&mut rand::rng()),
            };
            samples.shuffle(&mut rng);
        }
        Self {
            samples,
            cursor: 0,
            cfg,
            processed_batches: 0,
            processed_samples: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn next_batch<B: Backend>(
        &mut self,
        batch_size: usize,
        device: &B::Device,
    ) -> DatasetResult<Option<BurnBatch<B>>> {
        let batch_size = batch_size.max(1);
        if self.cursor >= self.samples.len() {
            return Ok(None);
        }
        let end = (self.cursor + batch_size).min(self.samples.len());
        if self.cfg.drop_last && end - self.cursor < batch_size {
            self.cursor = self.samples.len();
            return Ok(None);
        }
        let batch = collate::<B>(&self.samples[self.cursor..end], device)?;
        self.processed_samples += end - self.cursor;
        self.processed_batches += 1;
        self.cursor = end;
        if self.processed_batches % DEFAULT_LOG_EVERY_BATCHES == 0 {
            tracing::info!(
                batches = self.processed_batches,
                samples = self.processed_samples,
                remaining = self.samples.len() - self.cursor,
                "[dataset] batch progress"
            );
        }
        Ok(Some(batch))
    }
}
