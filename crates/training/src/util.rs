use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use cli_support::{GalaxyToolConfig, InputArgs, InputOpts, OutputArgs, SplitArgs};
use galaxy_dataset::{
    index_images, open_rgb, split_keys, task_record_keys, validate_labels, AugmentPipeline,
    ImageIndex, SplitConfig, Task, ValidationOutcome, ValidationReport,
};
use galaxy_labels::{GalaxyLabels, VoteTable};
use rayon::prelude::*;

use crate::manifest::{
    write_json, write_jsonl, LabelLine, SplitEntry, SplitsManifest, CROPS_DIR, LABELS_FILE,
    SPLITS_FILE, SUMMARY_FILE,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "prepare_labels",
    about = "Derive morphology labels from Galaxy Zoo votes and write train/test manifests"
)]
pub struct PrepareArgs {
    /// Tools config file (defaults to $GALAXY_TOOLS_CONFIG or ./galaxy-tools.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    #[command(flatten)]
    pub split: SplitArgs,
    /// Label every galaxy in the vote table instead of only those with an image.
    #[arg(long, default_value_t = false)]
    pub labels_only: bool,
    /// Also write every augmented variant as `crops/<GalaxyID>_<deg>.png`.
    #[arg(long, default_value_t = false)]
    pub export_crops: bool,
}

#[derive(Debug, Clone)]
pub struct PrepareSummary {
    pub output_root: PathBuf,
    pub galaxies: usize,
    pub report: ValidationReport,
    pub splits: SplitsManifest,
    pub crops_written: usize,
}

pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<GalaxyToolConfig> {
    match path {
        Some(path) => {
            let mut cfg = GalaxyToolConfig::from_path(path)
                .with_context(|| format!("loading tools config {}", path.display()))?;
            cfg.thresholds = galaxy_dataset::ValidationThresholds::from_env().or(cfg.thresholds);
            cfg.warn_if_invalid();
            Ok(cfg)
        }
        None => Ok(GalaxyToolConfig::load()),
    }
}

fn build_splits(
    labels: &[GalaxyLabels],
    rotations_deg: &[u16],
    split: SplitConfig,
) -> anyhow::Result<SplitsManifest> {
    let mut tasks = BTreeMap::new();
    for task in Task::ALL {
        let keys = task_record_keys(task, labels, rotations_deg);
        let (train, test) = split_keys(&keys, &split)
            .with_context(|| format!("splitting {task} records"))?;
        tracing::info!(
            task = task.as_str(),
            train = train.len(),
            test = test.len(),
            "split task records"
        );
        tasks.insert(task.as_str().to_string(), SplitEntry { train, test });
    }
    Ok(SplitsManifest {
        split,
        rotations_deg: rotations_deg.to_vec(),
        tasks,
    })
}

fn export_crops(
    indices: &[ImageIndex],
    pipeline: &AugmentPipeline,
    out_dir: &Path,
) -> anyhow::Result<usize> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let written: Vec<usize> = indices
        .par_iter()
        .map(|idx| -> anyhow::Result<usize> {
            let img = open_rgb(&idx.path)?;
            let variants = pipeline.variants(&img)?;
            for (deg, variant) in &variants {
                let path = out_dir.join(format!("{}_{:03}.png", idx.galaxy_id, deg));
                variant
                    .save(&path)
                    .with_context(|| format!("writing crop {}", path.display()))?;
            }
            Ok(variants.len())
        })
        .collect::<anyhow::Result<_>>()?;
    Ok(written.into_iter().sum())
}

/// Derive, validate, split, and write the label manifests.
///
/// Manifests are written even when validation fails, so the summary can be inspected;
/// the failure is then reported as an error.
pub fn run_prepare(args: PrepareArgs) -> anyhow::Result<PrepareSummary> {
    let cfg = load_config(args.config.as_deref())?;
    let inputs = InputOpts::resolve(&args.input, &cfg);
    let output_root = args.output.resolve(&cfg);
    let split = args.split.apply(cfg.split);
    let pipeline = AugmentPipeline::from_config(&cfg.augment);

    let votes = VoteTable::from_csv_path(&inputs.votes_csv)
        .with_context(|| format!("loading votes from {}", inputs.votes_csv.display()))?;

    let indices = if args.labels_only {
        Vec::new()
    } else {
        index_images(&inputs.images_dir)
            .with_context(|| format!("indexing images in {}", inputs.images_dir.display()))?
    };
    let ids: Vec<u64> = if args.labels_only {
        votes.ids().collect()
    } else {
        indices.iter().map(|idx| idx.galaxy_id).collect()
    };
    if ids.is_empty() {
        bail!("no galaxies to label");
    }

    let labels = votes.derive_many(&ids).context("deriving labels")?;
    tracing::info!(galaxies = labels.len(), "derived labels");

    let report = validate_labels(&labels, &cfg.thresholds);
    let splits = build_splits(&labels, &pipeline.rotations_deg, split)?;

    fs::create_dir_all(&output_root)
        .with_context(|| format!("creating {}", output_root.display()))?;
    let lines: Vec<LabelLine> = labels.iter().map(LabelLine::from).collect();
    write_jsonl(&output_root.join(LABELS_FILE), &lines)?;
    write_json(&output_root.join(SPLITS_FILE), &splits)?;
    write_json(&output_root.join(SUMMARY_FILE), &report)?;

    let crops_written = if args.export_crops {
        let n = export_crops(&indices, &pipeline, &output_root.join(CROPS_DIR))?;
        tracing::info!(crops = n, pipeline = %pipeline.describe(), "exported crops");
        n
    } else {
        0
    };

    tracing::info!(
        output = %output_root.display(),
        outcome = report.outcome.as_str(),
        "wrote label manifests"
    );
    if report.outcome == ValidationOutcome::Fail {
        bail!(
            "label validation failed: {}",
            report.reasons.join("; ")
        );
    }

    Ok(PrepareSummary {
        output_root,
        galaxies: labels.len(),
        report,
        splits,
        crops_written,
    })
}
