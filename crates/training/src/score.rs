use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use galaxy_dataset::{AugmentPipeline, Task};
use galaxy_labels::{GalaxyLabels, LabelError};
use serde::Serialize;

use crate::classifier::{EvalAccumulator, EvalReport};
use crate::manifest::{read_jsonl, LabelLine, PredictionLine};
use crate::single::{classify_image, eval_image_galaxy_id, ImagePrediction, StoredPrediction};
use crate::util::load_config;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskArg {
    Morphology,
    SpiralSubtype,
    EllipticalSubtype,
}

impl From<TaskArg> for Task {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Morphology => Task::Morphology,
            TaskArg::SpiralSubtype => Task::SpiralSubtype,
            TaskArg::EllipticalSubtype => Task::EllipticalSubtype,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "score_predictions",
    about = "Score classifier probabilities against derived galaxy labels"
)]
pub struct ScoreArgs {
    /// labels.jsonl written by prepare_labels.
    #[arg(long)]
    pub labels: PathBuf,
    /// JSON lines of {"galaxy_id": .., "probabilities": [..]}.
    #[arg(long)]
    pub predictions: PathBuf,
    #[arg(long, value_enum, default_value_t = TaskArg::Morphology)]
    pub task: TaskArg,
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
    /// Report the prediction for this one photograph instead of the whole file.
    #[arg(long)]
    pub image: Option<PathBuf>,
    /// Tools config whose `[augment]` section gives the crop for `--image`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ImageReport {
    galaxy_id: u64,
    expected: Option<&'static str>,
    #[serde(flatten)]
    prediction: ImagePrediction,
}

/// Score every prediction whose galaxy takes part in `task`; others are skipped.
pub fn score(
    task: Task,
    labels: &HashMap<u64, GalaxyLabels>,
    predictions: &[PredictionLine],
) -> anyhow::Result<EvalReport> {
    let mut acc = EvalAccumulator::new(task.num_classes());
    let mut skipped = 0usize;
    for pred in predictions {
        let galaxy = labels
            .get(&pred.galaxy_id)
            .ok_or(LabelError::UnknownIdentifier {
                galaxy_id: pred.galaxy_id,
            })?;
        let Some(target) = task.target(galaxy) else {
            skipped += 1;
            continue;
        };
        acc.push(pred.galaxy_id, &pred.probabilities, &target)?;
    }
    if skipped > 0 {
        tracing::info!(task = task.as_str(), skipped, "predictions outside task branch skipped");
    }
    Ok(acc.report())
}

pub fn format_report(task: Task, report: &EvalReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "task: {task}");
    let _ = writeln!(out, "samples: {}", report.samples);
    let _ = writeln!(out, "loss: {:.6}", report.loss);
    let _ = writeln!(out, "accuracy: {:.4}", report.accuracy);
    let names = task.class_names();
    let _ = writeln!(out, "confusion (rows = target, cols = predicted): {}", names.join(" "));
    for (name, row) in names.iter().zip(&report.confusion) {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        let _ = writeln!(out, "  {name:<12} {}", cells.join(" "));
    }
    out
}

pub fn run_score(args: ScoreArgs) -> anyhow::Result<String> {
    let task: Task = args.task.into();
    let labels: HashMap<u64, GalaxyLabels> = read_jsonl::<LabelLine>(&args.labels)?
        .into_iter()
        .map(|line| (line.labels.galaxy_id, line.labels))
        .collect();
    let predictions: Vec<PredictionLine> = read_jsonl(&args.predictions)?;
    if let Some(image) = &args.image {
        return score_image(&args, image, task, &labels, &predictions);
    }
    let report = score(task, &labels, &predictions)
        .with_context(|| format!("scoring {}", args.predictions.display()))?;
    tracing::info!(
        task = task.as_str(),
        samples = report.samples,
        accuracy = report.accuracy,
        "scored predictions"
    );
    Ok(match args.format {
        ReportFormat::Text => format_report(task, &report),
        ReportFormat::Json => serde_json::to_string_pretty(&report)?,
    })
}

fn score_image(
    args: &ScoreArgs,
    image: &Path,
    task: Task,
    labels: &HashMap<u64, GalaxyLabels>,
    predictions: &[PredictionLine],
) -> anyhow::Result<String> {
    let galaxy_id = eval_image_galaxy_id(image)
        .ok_or_else(|| anyhow!("{}: file name does not end in a galaxy id", image.display()))?;
    let stored = predictions
        .iter()
        .find(|p| p.galaxy_id == galaxy_id)
        .ok_or_else(|| {
            anyhow!(
                "{} has no prediction for galaxy {galaxy_id}",
                args.predictions.display()
            )
        })?;
    let cfg = load_config(args.config.as_deref())?;
    let pipeline = AugmentPipeline::from_config(&cfg.augment);
    let prediction = classify_image(
        &StoredPrediction(stored.probabilities.clone()),
        image,
        &pipeline,
        task,
    )?;
    let expected = labels
        .get(&galaxy_id)
        .and_then(|l| task.class_of(l))
        .map(|i| task.class_names()[i]);
    Ok(match args.format {
        ReportFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "task: {task}");
            let _ = writeln!(out, "galaxy: {galaxy_id}");
            out.push_str(&prediction.describe());
            if let Some(expected) = expected {
                let _ = writeln!(out, "expected: {expected}");
            }
            out
        }
        ReportFormat::Json => serde_json::to_string_pretty(&ImageReport {
            galaxy_id,
            expected,
            prediction,
        })?,
    })
}
