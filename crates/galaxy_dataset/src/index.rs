//! Indexing galaxy photographs on disk and loading them into records.

use crate::aug::AugmentPipeline;
use crate::types::{DatasetResult, GalaxyDatasetError, GalaxyRecord, ImageIndex};
use galaxy_labels::VoteTable;
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// Galaxy id from a file name such as `100008.jpg`.
pub fn galaxy_id_from_path(path: &Path) -> DatasetResult<u64> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| GalaxyDatasetError::InvalidImageName {
            path: path.to_path_buf(),
        })
}

/// Scan a flat directory of galaxy photographs, sorted by id. Each galaxy may have
/// only one photograph.
pub fn index_images(dir: &Path) -> DatasetResult<Vec<ImageIndex>> {
    let entries = fs::read_dir(dir).map_err(|e| GalaxyDatasetError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut indices = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_file() || !is_image(&path) {
            continue;
        }
        let galaxy_id = galaxy_id_from_path(&path)?;
        indices.push(ImageIndex { galaxy_id, path });
    }
    indices.sort_by(|a, b| a.galaxy_id.cmp(&b.galaxy_id).then_with(|| a.path.cmp(&b.path)));
    if let Some(pair) = indices.windows(2).find(|w| w[0].galaxy_id == w[1].galaxy_id) {
        return Err(GalaxyDatasetError::DuplicateImageId {
            galaxy_id: pair[0].galaxy_id,
            first: pair[0].path.clone(),
            second: pair[1].path.clone(),
        });
    }
    tracing::debug!(dir = %dir.display(), images = indices.len(), "indexed galaxy images");
    Ok(indices)
}

pub fn open_rgb(path: &Path) -> DatasetResult<image::RgbImage> {
    Ok(image::open(path)
        .map_err(|e| GalaxyDatasetError::Image {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8())
}

/// Decode and augment one photograph using the vote row already looked up for it.
pub fn load_image_records(
    idx: &ImageIndex,
    votes: Arc<data_contracts::VoteRow>,
    pipeline: &AugmentPipeline,
) -> DatasetResult<Vec<GalaxyRecord>> {
    let img = open_rgb(&idx.path)?;
    pipeline.apply(&img, votes)
}

/// Decode and augment every indexed photograph in parallel.
///
/// Output is ordered by index position, then by rotation as configured. Every image must
/// have a vote row; a miss fails with `UnknownIdentifier` before any decoding.
pub fn load_records(
    indices: &[ImageIndex],
    votes: &VoteTable,
    pipeline: &AugmentPipeline,
) -> DatasetResult<Vec<GalaxyRecord>> {
    let rows = indices
        .iter()
        .map(|idx| votes.lookup(idx.galaxy_id).map(|row| Arc::new(row.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    let loaded: Vec<DatasetResult<Vec<GalaxyRecord>>> = indices
        .par_iter()
        .zip(rows)
        .map(|(idx, row)| load_image_records(idx, row, pipeline))
        .collect();

    let mut records = Vec::with_capacity(indices.len() * pipeline.variants_per_image());
    for batch in loaded {
        records.extend(batch?);
    }
    tracing::info!(
        images = indices.len(),
        records = records.len(),
        pipeline = %pipeline.describe(),
        "loaded galaxy records"
    );
    Ok(records)
}
