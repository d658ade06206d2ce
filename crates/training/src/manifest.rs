//! On-disk formats written by `prepare_labels` and read by `score_predictions`.

use anyhow::Context;
use galaxy_dataset::{RecordKey, SplitConfig};
use galaxy_labels::GalaxyLabels;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub const LABELS_FILE: &str = "labels.jsonl";
pub const SPLITS_FILE: &str = "splits.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const CROPS_DIR: &str = "crops";

/// One row of `labels.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLine {
    #[serde(flatten)]
    pub labels: GalaxyLabels,
    pub binary_target: [f32; 2],
    pub spiral_target: Option<[f32; 3]>,
    pub elliptical_target: Option<[f32; 3]>,
}

impl From<&GalaxyLabels> for LabelLine {
    fn from(labels: &GalaxyLabels) -> Self {
        LabelLine {
            labels: *labels,
            binary_target: labels.binary_target(),
            spiral_target: labels.spiral_target(),
            elliptical_target: labels.elliptical_target(),
        }
    }
}

/// One row of a predictions file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionLine {
    pub galaxy_id: u64,
    pub probabilities: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitEntry {
    pub train: Vec<RecordKey>,
    pub test: Vec<RecordKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitsManifest {
    pub split: SplitConfig,
    pub rotations_deg: Vec<u16>,
    /// Keyed by task name.
    pub tasks: BTreeMap<String, SplitEntry>,
}

pub fn write_jsonl<'a, T: Serialize + 'a>(
    path: &Path,
    rows: impl IntoIterator<Item = &'a T>,
) -> anyhow::Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read a JSON-lines file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut rows = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed row", path.display(), i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}
