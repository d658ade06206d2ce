//! Crop, rotate, and resize pipeline that turns one photograph into training records.

use crate::types::{CropWindow, DatasetResult, GalaxyDatasetError, GalaxyRecord, ResizeFilter};
use data_contracts::VoteRow;
use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Eight rotations, 45° apart, applied counter-clockwise.
pub const DEFAULT_ROTATIONS: [u16; 8] = [0, 45, 90, 135, 180, 225, 270, 315];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    /// Resize the source photograph to this (width, height) before cropping.
    pub resize_to: Option<(u32, u32)>,
    /// Window cut out after the initial resize. None keeps the whole frame.
    pub crop: Option<CropWindow>,
    /// Counter-clockwise rotations in degrees; one record per entry.
    pub rotations_deg: Vec<u16>,
    /// Final (width, height) of every record.
    pub output_size: (u32, u32),
    pub filter: ResizeFilter,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            resize_to: Some((500, 500)),
            crop: Some(CropWindow {
                x: 175,
                y: 175,
                width: 150,
                height: 150,
            }),
            rotations_deg: DEFAULT_ROTATIONS.to_vec(),
            output_size: (50, 50),
            filter: ResizeFilter::CatmullRom,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AugmentPipeline {
    pub resize_to: Option<(u32, u32)>,
    pub crop: Option<CropWindow>,
    pub rotations_deg: Vec<u16>,
    pub output_size: (u32, u32),
    pub filter: ResizeFilter,
}

impl Default for AugmentPipeline {
    fn default() -> Self {
        Self::from_config(&AugmentConfig::default())
    }
}

impl AugmentPipeline {
    pub fn from_config(cfg: &AugmentConfig) -> Self {
        Self {
            resize_to: cfg.resize_to,
            crop: cfg.crop,
            rotations_deg: cfg.rotations_deg.clone(),
            output_size: cfg.output_size,
            filter: cfg.filter,
        }
    }

    pub fn variants_per_image(&self) -> usize {
        self.rotations_deg.len()
    }

    pub fn describe(&self) -> String {
        let resize = self
            .resize_to
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| "none".to_string());
        let crop = self
            .crop
            .map(|c| format!("{}x{}+{}+{}", c.width, c.height, c.x, c.y))
            .unwrap_or_else(|| "none".to_string());
        format!(
            "resize={} crop={} rotations={:?} output={}x{} filter={:?}",
            resize, crop, self.rotations_deg, self.output_size.0, self.output_size.1, self.filter
        )
    }

    /// Resize then cut the configured window.
    pub fn crop(&self, img: &RgbImage) -> DatasetResult<RgbImage> {
        let filter: FilterType = self.filter.into();
        let resized = match self.resize_to {
            Some((w, h)) if img.dimensions() != (w, h) => {
                image::imageops::resize(img, w, h, filter)
            }
            _ => img.clone(),
        };
        let Some(c) = self.crop else {
            return Ok(resized);
        };
        let (width, height) = resized.dimensions();
        let fits = c.width > 0
            && c.height > 0
            && c.x.checked_add(c.width).is_some_and(|r| r <= width)
            && c.y.checked_add(c.height).is_some_and(|b| b <= height);
        if !fits {
            return Err(GalaxyDatasetError::CropOutOfBounds {
                crop: c,
                width,
                height,
            });
        }
        Ok(image::imageops::crop_imm(&resized, c.x, c.y, c.width, c.height).to_image())
    }

    fn resize_output(&self, img: RgbImage) -> RgbImage {
        let (out_w, out_h) = self.output_size;
        if img.dimensions() == (out_w, out_h) {
            img
        } else {
            image::imageops::resize(&img, out_w, out_h, self.filter.into())
        }
    }

    /// Cropped image rotated by every configured angle and resized to the output size.
    pub fn variants(&self, img: &RgbImage) -> DatasetResult<Vec<(u16, RgbImage)>> {
        let cropped = self.crop(img)?;
        Ok(self
            .rotations_deg
            .iter()
            .map(|&deg| (deg, self.resize_output(rotate_ccw(&cropped, deg))))
            .collect())
    }

    /// The unrotated view a trained classifier is evaluated on.
    pub fn eval_view(&self, img: &RgbImage) -> DatasetResult<RgbImage> {
        Ok(self.resize_output(self.crop(img)?))
    }

    pub fn apply(&self, img: &RgbImage, votes: Arc<VoteRow>) -> DatasetResult<Vec<GalaxyRecord>> {
        let galaxy_id = votes.galaxy_id;
        Ok(self
            .variants(img)?
            .into_iter()
            .map(|(deg, variant)| build_record(&variant, galaxy_id, deg, Arc::clone(&votes)))
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct AugmentPipelineBuilder {
    inner: AugmentPipeline,
}

impl Default for AugmentPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AugmentPipelineBuilder {
    pub fn new() -> Self {
        Self {
            inner: AugmentPipeline::default(),
        }
    }
    pub fn resize_to(mut self, size: Option<(u32, u32)>) -> Self {
        self.inner.resize_to = size;
        self
    }
    pub fn crop(mut self, crop: Option<CropWindow>) -> Self {
        self.inner.crop = crop;
        self
    }
    pub fn rotations(mut self, degrees: &[u16]) -> Self {
        self.inner.rotations_deg = degrees.to_vec();
        self
    }
    pub fn output_size(mut self, width: u32, height: u32) -> Self {
        self.inner.output_size = (width, height);
        self
    }
    pub fn filter(mut self, filter: ResizeFilter) -> Self {
        self.inner.filter = filter;
        self
    }
    pub fn build(self) -> AugmentPipeline {
        self.inner
    }
}

/// Rotate about the centre keeping the canvas size; uncovered corners are black.
pub(crate) fn rotate_ccw(img: &RgbImage, degrees: u16) -> RgbImage {
    let degrees = degrees % 360;
    let square = img.width() == img.height();
    match degrees {
        0 => img.clone(),
        180 => image::imageops::rotate180(img),
        90 if square => image::imageops::rotate270(img),
        270 if square => image::imageops::rotate90(img),
        _ => {
            // imageproc rotates clockwise for positive angles.
            let theta = -(degrees as f32).to_radians();
            rotate_about_center(img, theta, Interpolation::Nearest, Rgb([0, 0, 0]))
        }
    }
}

/// CHW layout, normalized to [0, 1].
pub fn to_chw(img: &RgbImage) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut image_chw = vec![0.0f32; plane * 3];
    for (x, y, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        image_chw[base] = pixel[0] as f32 / 255.0;
        image_chw[plane + base] = pixel[1] as f32 / 255.0;
        image_chw[2 * plane + base] = pixel[2] as f32 / 255.0;
    }
    image_chw
}

fn build_record(
    img: &RgbImage,
    galaxy_id: u64,
    rotation_deg: u16,
    votes: Arc<VoteRow>,
) -> GalaxyRecord {
    let (width, height) = img.dimensions();
    GalaxyRecord {
        galaxy_id,
        rotation_deg,
        image_chw: to_chw(img),
        width,
        height,
        votes,
    }
}
