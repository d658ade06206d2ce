use crate::config::GalaxyToolConfig;
use clap::{Args, ValueEnum};
use galaxy_dataset::{SplitConfig, SplitMode};
use std::path::PathBuf;

/// Vote table and image directory shared by the dataset tools.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Galaxy Zoo vote fractions CSV (defaults to the config file's `votes_csv`).
    #[arg(long)]
    pub votes: Option<PathBuf>,
    /// Directory of `<GalaxyID>.jpg` photographs (defaults to the config file's `images_dir`).
    #[arg(long)]
    pub images: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct InputOpts {
    pub votes_csv: PathBuf,
    pub images_dir: PathBuf,
}

impl InputOpts {
    /// CLI values win over the config file.
    pub fn resolve(args: &InputArgs, cfg: &GalaxyToolConfig) -> Self {
        InputOpts {
            votes_csv: args.votes.clone().unwrap_or_else(|| cfg.votes_csv.clone()),
            images_dir: args.images.clone().unwrap_or_else(|| cfg.images_dir.clone()),
        }
    }
}

/// Output root for label manifests.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Directory to write labels.jsonl, splits.json, and summary.json into.
    #[arg(long)]
    pub output_root: Option<PathBuf>,
}

impl OutputArgs {
    pub fn resolve(&self, cfg: &GalaxyToolConfig) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(|| cfg.output_root.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitModeArg {
    Record,
    Galaxy,
}

impl From<SplitModeArg> for SplitMode {
    fn from(arg: SplitModeArg) -> Self {
        match arg {
            SplitModeArg::Record => SplitMode::ByRecord,
            SplitModeArg::Galaxy => SplitMode::ByGalaxy,
        }
    }
}

/// Train/test split overrides.
#[derive(Debug, Clone, Args)]
pub struct SplitArgs {
    /// Fraction held out for testing.
    #[arg(long)]
    pub test_ratio: Option<f64>,
    /// Shuffle seed.
    #[arg(long)]
    pub seed: Option<u64>,
    /// Split individual variants or whole galaxies.
    #[arg(long, value_enum)]
    pub split_mode: Option<SplitModeArg>,
}

impl SplitArgs {
    pub fn apply(&self, base: SplitConfig) -> SplitConfig {
        SplitConfig {
            test_ratio: self.test_ratio.unwrap_or(base.test_ratio),
            seed: self.seed.unwrap_or(base.seed),
            mode: self.split_mode.map(Into::into).unwrap_or(base.mode),
        }
    }
}
