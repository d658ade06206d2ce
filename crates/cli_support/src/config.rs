use std::path::{Path, PathBuf};

use galaxy_dataset::{AugmentConfig, SplitConfig, ValidationThresholds};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG_NAME: &str = "galaxy-tools.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tools config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tools config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone)]
pub struct GalaxyToolConfig {
    pub data_root: PathBuf,
    pub votes_csv: PathBuf,
    pub images_dir: PathBuf,
    pub output_root: PathBuf,
    pub augment: AugmentConfig,
    pub split: SplitConfig,
    pub thresholds: ValidationThresholds,
}

impl Default for GalaxyToolConfig {
    fn default() -> Self {
        let data_root = PathBuf::from("data");
        Self {
            votes_csv: data_root.join("training_solutions_rev1.csv"),
            images_dir: data_root.join("images_training_rev1"),
            data_root,
            output_root: PathBuf::from("artifacts/galaxy_labels"),
            augment: AugmentConfig::default(),
            split: SplitConfig::default(),
            thresholds: ValidationThresholds::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct GalaxyToolConfigFile {
    data_root: Option<String>,
    votes_csv: Option<String>,
    images_dir: Option<String>,
    output_root: Option<String>,
    augment: Option<AugmentConfig>,
    split: Option<SplitConfig>,
    validation: Option<ValidationThresholds>,
}

impl GalaxyToolConfig {
    /// Load from `GALAXY_TOOLS_CONFIG` or `./galaxy-tools.toml`, falling back to defaults.
    /// Validation thresholds from the environment win over the file.
    pub fn load() -> Self {
        let path = std::env::var("GALAXY_TOOLS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        let mut cfg = if path.exists() {
            Self::from_path(&path).unwrap_or_else(|err| {
                tracing::warn!(%err, "tools config: using defaults");
                Self::default()
            })
        } else {
            Self::default()
        };
        cfg.thresholds = ValidationThresholds::from_env().or(cfg.thresholds);
        cfg.warn_if_invalid();
        cfg
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: GalaxyToolConfigFile =
            toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: GalaxyToolConfigFile) -> Self {
        let data_root = file
            .data_root
            .map(|v| expand_path(&v))
            .unwrap_or_else(|| PathBuf::from("data"));
        let votes_csv = file
            .votes_csv
            .map(|v| expand_path(&v))
            .unwrap_or_else(|| data_root.join("training_solutions_rev1.csv"));
        let images_dir = file
            .images_dir
            .map(|v| expand_path(&v))
            .unwrap_or_else(|| data_root.join("images_training_rev1"));

        GalaxyToolConfig {
            data_root,
            votes_csv,
            images_dir,
            output_root: file
                .output_root
                .map(|v| expand_path(&v))
                .unwrap_or_else(|| PathBuf::from("artifacts/galaxy_labels")),
            augment: file.augment.unwrap_or_default(),
            split: file.split.unwrap_or_default(),
            thresholds: file.validation.unwrap_or_default(),
        }
    }

    /// Log values that will make the tools fail or behave surprisingly.
    pub fn warn_if_invalid(&self) {
        if self.votes_csv.as_os_str().is_empty() {
            tracing::warn!("tools config: votes_csv is empty; prepare_labels will fail to load votes");
        }
        if !(0.0..=1.0).contains(&self.split.test_ratio) {
            tracing::warn!(
                test_ratio = self.split.test_ratio,
                "tools config: split.test_ratio is outside [0, 1]; splitting will fail"
            );
        }
        if self.augment.rotations_deg.is_empty() {
            tracing::warn!("tools config: augment.rotations_deg is empty; no records will be produced");
        }
        let (w, h) = self.augment.output_size;
        if w == 0 || h == 0 {
            tracing::warn!(width = w, height = h, "tools config: augment.output_size has a zero side");
        }
    }
}

pub fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

/// Replace `${VAR}` with its value; unknown variables are left as written.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match std::env::var(key) {
            Ok(val) => out.push_str(&val),
            Err(_) => {
                out.push_str("${");
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
