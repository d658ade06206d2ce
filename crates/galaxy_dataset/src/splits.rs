//! Seeded train/test splitting.

use crate::types::{DatasetResult, GalaxyDatasetError, GalaxyRecord, RecordKey, SplitMode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of items (or galaxies, by mode) held out for testing.
    pub test_ratio: f64,
    pub seed: u64,
    pub mode: SplitMode,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            mode: SplitMode::ByRecord,
        }
    }
}

fn test_count(n: usize, ratio: f64) -> usize {
    ((n as f64 * ratio).ceil() as usize).min(n)
}

/// Positions of the train and test items. `group_of` maps a position to its galaxy id.
fn split_positions(
    n: usize,
    group_of: impl Fn(usize) -> u64,
    cfg: &SplitConfig,
) -> DatasetResult<(Vec<usize>, Vec<usize>)> {
    if !(0.0..=1.0).contains(&cfg.test_ratio) {
        return Err(GalaxyDatasetError::InvalidSplitRatio(cfg.test_ratio));
    }
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    match cfg.mode {
        SplitMode::ByRecord => {
            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);
            let train = order.split_off(test_count(n, cfg.test_ratio));
            Ok((train, order))
        }
        SplitMode::ByGalaxy => {
            let mut groups: Vec<u64> = (0..n)
                .map(&group_of)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            let held_out_count = test_count(groups.len(), cfg.test_ratio);
            groups.shuffle(&mut rng);
            let held_out: HashSet<u64> = groups.into_iter().take(held_out_count).collect();
            let (test, train): (Vec<usize>, Vec<usize>) =
                (0..n).partition(|&i| held_out.contains(&group_of(i)));
            Ok((train, test))
        }
    }
}

/// Split record keys into (train, test).
pub fn split_keys(
    keys: &[RecordKey],
    cfg: &SplitConfig,
) -> DatasetResult<(Vec<RecordKey>, Vec<RecordKey>)> {
    let (train, test) = split_positions(keys.len(), |i| keys[i].galaxy_id, cfg)?;
    Ok((
        train.into_iter().map(|i| keys[i]).collect(),
        test.into_iter().map(|i| keys[i]).collect(),
    ))
}

/// Split loaded records into (train, test) with the same assignment `split_keys` would give
/// for their keys.
pub fn split_records(
    records: Vec<GalaxyRecord>,
    cfg: &SplitConfig,
) -> DatasetResult<(Vec<GalaxyRecord>, Vec<GalaxyRecord>)> {
    let (train_pos, _) = split_positions(records.len(), |i| records[i].galaxy_id, cfg)?;
    let train_set: HashSet<usize> = train_pos.into_iter().collect();
    let (train, test) = records
        .into_iter()
        .enumerate()
        .partition::<Vec<_>, _>(|(i, _)| train_set.contains(i));
    Ok((
        train.into_iter().map(|(_, r)| r).collect(),
        test.into_iter().map(|(_, r)| r).collect(),
    ))
}
