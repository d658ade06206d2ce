//! Classify one photograph the way a trained model sees it at evaluation time.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use galaxy_dataset::{open_rgb, to_chw, AugmentPipeline, Task};
use serde::Serialize;

use crate::classifier::{argmax, Classifier};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePrediction {
    pub task: Task,
    pub class: &'static str,
    pub probabilities: Vec<f32>,
}

impl ImagePrediction {
    /// One line per class with its probability, then the chosen class.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (name, p) in self.task.class_names().iter().zip(&self.probabilities) {
            let _ = writeln!(out, "  {name:<12} {p:.2}");
        }
        let _ = writeln!(out, "predicted: {}", self.class);
        out
    }
}

/// Crop, resize and run `classifier` on the unrotated view of the image at `path`.
pub fn classify_image<C: Classifier + ?Sized>(
    classifier: &C,
    path: &Path,
    pipeline: &AugmentPipeline,
    task: Task,
) -> anyhow::Result<ImagePrediction> {
    if classifier.num_classes() != task.num_classes() {
        bail!(
            "classifier has {} classes but {task} has {}",
            classifier.num_classes(),
            task.num_classes()
        );
    }
    if !path.exists() {
        bail!("image not found: {}", path.display());
    }
    let img = open_rgb(path)?;
    let view = pipeline
        .eval_view(&img)
        .with_context(|| format!("preparing {}", path.display()))?;
    let (width, height) = view.dimensions();
    let probabilities = classifier.predict(&to_chw(&view), width, height);
    if probabilities.len() != task.num_classes() {
        bail!(
            "{}: expected {} probabilities, got {}",
            path.display(),
            task.num_classes(),
            probabilities.len()
        );
    }
    let class = task.class_names()[argmax(&probabilities)];
    tracing::debug!(path = %path.display(), task = task.as_str(), class, "classified image");
    Ok(ImagePrediction {
        task,
        class,
        probabilities,
    })
}

/// Galaxy id of an evaluation photograph: the last `_`-separated part of the file
/// stem, so both `100008.jpg` and `barred_2_100008.jpg` name galaxy 100008.
pub fn eval_image_galaxy_id(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.rsplit('_').next()?.parse().ok()
}

/// Probabilities a model outside this workspace produced for one photograph.
#[derive(Debug, Clone)]
pub struct StoredPrediction(pub Vec<f32>);

impl Classifier for StoredPrediction {
    fn num_classes(&self) -> usize {
        self.0.len()
    }

    fn predict(&self, _image_chw: &[f32], _width: u32, _height: u32) -> Vec<f32> {
        self.0.clone()
    }
}
