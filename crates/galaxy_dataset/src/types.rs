//! Core types, error definitions, and data structures for galaxy_dataset.

use crate::tasks::Task;
use data_contracts::VoteRow;
use galaxy_labels::{LabelError, VoteTableError};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, GalaxyDatasetError>;

#[derive(Debug, Error)]
pub enum GalaxyDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image file name is not a galaxy id: {path}")]
    InvalidImageName { path: PathBuf },
    #[error("galaxy {galaxy_id} has more than one image: {first} and {second}")]
    DuplicateImageId {
        galaxy_id: u64,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("crop window {crop:?} does not fit a {width}x{height} image")]
    CropOutOfBounds {
        crop: CropWindow,
        width: u32,
        height: u32,
    },
    #[error("split ratio {0} is outside [0, 1]")]
    InvalidSplitRatio(f64),
    #[error("record for galaxy {galaxy_id} has no derived labels")]
    Unlabeled { galaxy_id: u64 },
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Votes(#[from] VoteTableError),
    #[error("{0}")]
    Other(String),
}

/// One source photograph found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageIndex {
    pub galaxy_id: u64,
    pub path: PathBuf,
}

/// Identifies an augmented variant without carrying its pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub galaxy_id: u64,
    pub rotation_deg: u16,
}

/// One augmented variant of a galaxy photograph.
#[derive(Debug, Clone)]
pub struct GalaxyRecord {
    pub galaxy_id: u64,
    pub rotation_deg: u16,
    /// Image in CHW layout, normalized to [0, 1].
    pub image_chw: Vec<f32>,
    pub width: u32,
    pub height: u32,
    /// Shared with every other variant of the same galaxy.
    pub votes: Arc<VoteRow>,
}

impl GalaxyRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            galaxy_id: self.galaxy_id,
            rotation_deg: self.rotation_deg,
        }
    }
}

/// Pixel window cut from the resized source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    /// Bicubic.
    CatmullRom,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitMode {
    /// Every augmented variant is split independently.
    #[default]
    ByRecord,
    /// All variants of a galaxy land on the same side.
    ByGalaxy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassCount {
    pub class: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task: Task,
    pub total: usize,
    pub classes: Vec<ClassCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelSummary {
    pub galaxies: usize,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Pass,
    Warn,
    Fail,
}

impl ValidationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationOutcome::Pass => "pass",
            ValidationOutcome::Warn => "warn",
            ValidationOutcome::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Every class of every populated task needs at least this many galaxies.
    pub min_class_count: Option<usize>,
    /// Largest allowed ratio between the biggest and smallest class of a task.
    pub max_imbalance_ratio: Option<f32>,
}

impl ValidationThresholds {
    pub fn from_env() -> Self {
        fn parse_usize(key: &str) -> Option<usize> {
            std::env::var(key).ok()?.parse().ok()
        }
        fn parse_ratio(key: &str) -> Option<f32> {
            std::env::var(key).ok()?.parse().ok()
        }
        ValidationThresholds {
            min_class_count: parse_usize("GALAXY_DATASET_MIN_CLASS_COUNT"),
            max_imbalance_ratio: parse_ratio("GALAXY_DATASET_MAX_IMBALANCE_RATIO"),
        }
    }

    /// Fill unset thresholds from `other`.
    pub fn or(self, other: ValidationThresholds) -> Self {
        ValidationThresholds {
            min_class_count: self.min_class_count.or(other.min_class_count),
            max_imbalance_ratio: self.max_imbalance_ratio.or(other.max_imbalance_ratio),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub outcome: ValidationOutcome,
    pub reasons: Vec<String>,
    pub summary: LabelSummary,
}
