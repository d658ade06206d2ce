//! The three classification tasks and the record/target pairs that feed them.

use crate::types::{DatasetResult, GalaxyDatasetError, GalaxyRecord, RecordKey};
use galaxy_labels::{BinaryClass, EllipticalSubtype, GalaxyLabels, Morphology, SpiralSubtype};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    /// Elliptical vs. spiral; every galaxy takes part.
    Morphology,
    /// Edge-on / not barred / barred; spirals only.
    SpiralSubtype,
    /// E0–E1 / E2–E5 / E6–E7; ellipticals only.
    EllipticalSubtype,
}

impl Task {
    pub const ALL: [Task; 3] = [Task::Morphology, Task::SpiralSubtype, Task::EllipticalSubtype];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Morphology => "morphology",
            Task::SpiralSubtype => "spiral_subtype",
            Task::EllipticalSubtype => "elliptical_subtype",
        }
    }

    pub fn class_names(&self) -> &'static [&'static str] {
        match self {
            Task::Morphology => &BinaryClass::NAMES,
            Task::SpiralSubtype => &SpiralSubtype::NAMES,
            Task::EllipticalSubtype => &EllipticalSubtype::NAMES,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.class_names().len()
    }

    /// Class index for this task, or None when the galaxy is on the other branch.
    pub fn class_of(&self, labels: &GalaxyLabels) -> Option<usize> {
        match (self, labels.morphology) {
            (Task::Morphology, m) => Some(m.binary().index()),
            (Task::SpiralSubtype, Morphology::Spiral(sub)) => Some(sub.index()),
            (Task::EllipticalSubtype, Morphology::Elliptical(sub)) => Some(sub.index()),
            _ => None,
        }
    }

    pub fn target(&self, labels: &GalaxyLabels) -> Option<Vec<f32>> {
        match self {
            Task::Morphology => Some(labels.binary_target().to_vec()),
            Task::SpiralSubtype => labels.spiral_target().map(|t| t.to_vec()),
            Task::EllipticalSubtype => labels.elliptical_target().map(|t| t.to_vec()),
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of every augmented variant whose galaxy takes part in `task`.
pub fn task_record_keys(task: Task, labels: &[GalaxyLabels], rotations_deg: &[u16]) -> Vec<RecordKey> {
    labels
        .iter()
        .filter(|l| task.class_of(l).is_some())
        .flat_map(|l| {
            rotations_deg.iter().map(move |&rotation_deg| RecordKey {
                galaxy_id: l.galaxy_id,
                rotation_deg,
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TaskSample<'a> {
    pub record: &'a GalaxyRecord,
    pub target: Vec<f32>,
}

/// Augmented records together with the labels derived for their galaxies.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    records: Vec<GalaxyRecord>,
    labels: HashMap<u64, GalaxyLabels>,
}

impl LabeledDataset {
    /// Every record must have labels for its galaxy.
    pub fn new(
        records: Vec<GalaxyRecord>,
        labels: impl IntoIterator<Item = GalaxyLabels>,
    ) -> DatasetResult<Self> {
        let labels: HashMap<u64, GalaxyLabels> =
            labels.into_iter().map(|l| (l.galaxy_id, l)).collect();
        if let Some(r) = records.iter().find(|r| !labels.contains_key(&r.galaxy_id)) {
            return Err(GalaxyDatasetError::Unlabeled {
                galaxy_id: r.galaxy_id,
            });
        }
        Ok(Self { records, labels })
    }

    pub fn records(&self) -> &[GalaxyRecord] {
        &self.records
    }

    pub fn labels_for(&self, galaxy_id: u64) -> Option<&GalaxyLabels> {
        self.labels.get(&galaxy_id)
    }

    /// Records on the task's branch, paired with their one-hot targets, in record order.
    pub fn task_samples(&self, task: Task) -> Vec<TaskSample<'_>> {
        self.records
            .iter()
            .filter_map(|record| {
                let labels = self.labels.get(&record.galaxy_id)?;
                task.target(labels).map(|target| TaskSample { record, target })
            })
            .collect()
    }
}
