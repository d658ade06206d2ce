//! Galaxy image loading, augmentation, splitting, and Burn-compatible batching.
//!
//! This crate provides utilities for:
//! - Indexing galaxy photographs named by their Galaxy Zoo id
//! - Crop/rotate/resize augmentation (eight 45° rotations by default)
//! - Per-task sample views over derived labels
//! - Seeded train/test splitting by record or by galaxy
//! - Class-balance validation
//! - Burn-compatible batch iteration (`burn-runtime` feature)

pub mod aug;
pub mod index;
pub mod splits;
pub mod tasks;
pub mod types;
pub mod validation;

#[cfg(feature = "burn-runtime")]
pub mod batch;

pub use aug::{to_chw, AugmentConfig, AugmentPipeline, AugmentPipelineBuilder, DEFAULT_ROTATIONS};
pub use index::{galaxy_id_from_path, index_images, load_image_records, load_records, open_rgb};
pub use splits::{split_keys, split_records, SplitConfig};
pub use tasks::{task_record_keys, LabeledDataset, Task, TaskSample};
pub use types::*;
pub use validation::{summarize_labels, validate_labels, validate_summary};

#[cfg(feature = "burn-runtime")]
pub use batch::{collate, BatchConfig, BatchIter, BurnBatch};
