//! Integration tests for end-to-end galaxy_dataset workflows.
//!
//! These tests verify that the major workflows work correctly together:
//! 1. Images on disk → augmented records
//! 2. Records → per-task samples → splits
//! 3. Derived labels → validation
//! 4. Task samples → Burn batches (burn-runtime feature)

use galaxy_dataset::{
    index_images, load_records, split_keys, split_records, task_record_keys, validate_labels,
    AugmentPipeline, AugmentPipelineBuilder, GalaxyDatasetError, LabeledDataset, SplitConfig,
    SplitMode, Task, ValidationOutcome, ValidationThresholds,
};
use galaxy_labels::{LabelError, VoteTable};
use image::{Rgb, RgbImage};
use std::collections::HashSet;
use std::path::Path;

const GALAXY_ZOO_CSV: &str = "\
GalaxyID,Class1.1,Class1.2,Class1.3,Class2.1,Class2.2,Class3.1,Class3.2,Class7.1,Class7.2,Class7.3
100008,0.383147,0.616853,0.0,0.0,0.616853,0.038452,0.578401,0.0,0.0,0.0
100023,0.327001,0.663777,0.009222,0.031178,0.632599,0.46737,0.165229,0.0,0.0,0.0
100053,0.765717,0.177352,0.056931,0.0,0.177352,0.0,0.177352,0.0,0.135082,0.630635
100078,0.693377,0.238564,0.068059,0.0,0.238564,0.0,0.238564,0.693377,0.0,0.0
";

fn write_uniform_png(dir: &Path, name: &str, value: u8) -> anyhow::Result<()> {
    let img = RgbImage::from_pixel(500, 500, Rgb([value, value, value]));
    img.save(dir.join(name))?;
    Ok(())
}

fn small_pipeline() -> AugmentPipeline {
    AugmentPipelineBuilder::new()
        .resize_to(None)
        .crop(None)
        .rotations(&[0, 90])
        .output_size(8, 8)
        .build()
}

fn write_small_png(dir: &Path, galaxy_id: u64) -> anyhow::Result<()> {
    RgbImage::from_pixel(16, 16, Rgb([120, 60, 30])).save(dir.join(format!("{galaxy_id}.png")))?;
    Ok(())
}

#[test]
fn images_become_eight_rotated_records() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_uniform_png(tmp.path(), "100008.png", 200)?;
    std::fs::write(tmp.path().join("notes.txt"), "not an image")?;

    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let indices = index_images(tmp.path())?;
    assert_eq!(indices.len(), 1);
    assert_eq!(indices[0].galaxy_id, 100008);

    let records = load_records(&indices, &votes, &AugmentPipeline::default())?;
    assert_eq!(records.len(), 8);
    let rotations: Vec<u16> = records.iter().map(|r| r.rotation_deg).collect();
    assert_eq!(rotations, vec![0, 45, 90, 135, 180, 225, 270, 315]);
    for record in &records {
        assert_eq!((record.width, record.height), (50, 50));
        assert_eq!(record.image_chw.len(), 50 * 50 * 3);
        assert_eq!(record.votes.galaxy_id, 100008);
    }

    // The unrotated crop of a uniform photograph stays uniform.
    let expected = 200.0 / 255.0;
    assert!(records[0]
        .image_chw
        .iter()
        .all(|v| (v - expected).abs() <= 1.0 / 255.0 + 1e-6));
    // Diagonal rotations leave black corners.
    assert_eq!(records[1].image_chw[0], 0.0);
    Ok(())
}

#[test]
fn unknown_galaxy_image_fails_before_decoding() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_small_png(tmp.path(), 100008)?;
    // Not decodable, but the id lookup fails first.
    std::fs::write(tmp.path().join("555.png"), b"garbage")?;

    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let indices = index_images(tmp.path())?;
    let err = load_records(&indices, &votes, &small_pipeline()).unwrap_err();
    assert!(matches!(
        err,
        GalaxyDatasetError::Labels(LabelError::UnknownIdentifier { galaxy_id: 555 })
    ));
    Ok(())
}

#[test]
fn non_numeric_image_name_is_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_small_png(tmp.path(), 100008)?;
    RgbImage::new(4, 4).save(tmp.path().join("thumbnail.png"))?;
    assert!(matches!(
        index_images(tmp.path()),
        Err(GalaxyDatasetError::InvalidImageName { .. })
    ));
    Ok(())
}

#[test]
fn same_galaxy_under_two_names_is_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_small_png(tmp.path(), 100053)?;
    write_small_png(tmp.path(), 100008)?;
    // Leading zero parses to the same id.
    RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])).save(tmp.path().join("0100008.png"))?;
    let err = index_images(tmp.path()).unwrap_err();
    match err {
        GalaxyDatasetError::DuplicateImageId {
            galaxy_id,
            first,
            second,
        } => {
            assert_eq!(galaxy_id, 100008);
            assert_ne!(first, second);
            let names: HashSet<_> = [first, second]
                .iter()
                .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
                .collect();
            assert!(names.contains("100008.png"));
            assert!(names.contains("0100008.png"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // Same id, different extension.
    let tmp = tempfile::tempdir()?;
    write_small_png(tmp.path(), 100008)?;
    RgbImage::from_pixel(16, 16, Rgb([1, 2, 3])).save(tmp.path().join("100008.jpg"))?;
    assert!(matches!(
        index_images(tmp.path()),
        Err(GalaxyDatasetError::DuplicateImageId {
            galaxy_id: 100008,
            ..
        })
    ));
    Ok(())
}

#[test]
fn task_views_and_splits_follow_labels() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    for id in [100008, 100023, 100053, 100078] {
        write_small_png(tmp.path(), id)?;
    }
    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let ids: Vec<u64> = votes.ids().collect();
    let labels = votes.derive_many(&ids)?;

    let records = load_records(&index_images(tmp.path())?, &votes, &small_pipeline())?;
    assert_eq!(records.len(), 8);
    let dataset = LabeledDataset::new(records.clone(), labels.clone())?;

    let morph = dataset.task_samples(Task::Morphology);
    assert_eq!(morph.len(), 8);
    let spiral = dataset.task_samples(Task::SpiralSubtype);
    assert_eq!(spiral.len(), 4);
    assert!(spiral.iter().all(|s| s.target.len() == 3));
    let elliptical = dataset.task_samples(Task::EllipticalSubtype);
    assert_eq!(elliptical.len(), 4);
    // 100053 is a cigar, 100078 is round.
    assert_eq!(elliptical[0].target, vec![0.0, 0.0, 1.0]);
    assert_eq!(elliptical[2].target, vec![1.0, 0.0, 0.0]);

    let keys = task_record_keys(Task::Morphology, &labels, &[0, 90]);
    let cfg = SplitConfig::default();
    let (train_a, test_a) = split_keys(&keys, &cfg)?;
    let (train_b, test_b) = split_keys(&keys, &cfg)?;
    assert_eq!(train_a, train_b);
    assert_eq!(test_a, test_b);
    assert_eq!(test_a.len(), 2);
    let train_set: HashSet<_> = train_a.iter().collect();
    assert!(test_a.iter().all(|k| !train_set.contains(k)));

    // Loaded records split the same way as their keys.
    let (train_records, test_records) = split_records(records, &cfg)?;
    let record_test: Vec<_> = test_records.iter().map(|r| r.key()).collect();
    let mut expected_test = test_a.clone();
    expected_test.sort();
    let mut got_test = record_test.clone();
    got_test.sort();
    assert_eq!(got_test, expected_test);
    assert_eq!(train_records.len(), 6);

    let by_galaxy = SplitConfig {
        mode: SplitMode::ByGalaxy,
        test_ratio: 0.25,
        ..Default::default()
    };
    let (train, test) = split_keys(&keys, &by_galaxy)?;
    let test_ids: HashSet<u64> = test.iter().map(|k| k.galaxy_id).collect();
    assert_eq!(test_ids.len(), 1);
    assert_eq!(test.len(), 2);
    assert!(train.iter().all(|k| !test_ids.contains(&k.galaxy_id)));
    Ok(())
}

#[test]
fn record_without_labels_is_rejected() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    write_small_png(tmp.path(), 100008)?;
    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let records = load_records(&index_images(tmp.path())?, &votes, &small_pipeline())?;
    let err = LabeledDataset::new(records, Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        GalaxyDatasetError::Unlabeled { galaxy_id: 100008 }
    ));
    Ok(())
}

#[test]
fn validation_flags_sparse_classes() -> anyhow::Result<()> {
    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let ids: Vec<u64> = votes.ids().collect();
    let labels = votes.derive_many(&ids)?;

    // No edge-on spiral and no in-between elliptical in the fixture.
    let lenient = validate_labels(&labels, &ValidationThresholds::default());
    assert_eq!(lenient.outcome, ValidationOutcome::Warn);
    assert_eq!(lenient.summary.galaxies, 4);
    assert_eq!(lenient.summary.tasks[0].total, 4);

    let strict = validate_labels(
        &labels,
        &ValidationThresholds {
            min_class_count: Some(1),
            max_imbalance_ratio: None,
        },
    );
    assert_eq!(strict.outcome, ValidationOutcome::Fail);
    assert!(strict
        .reasons
        .iter()
        .any(|r| r.contains("spiral_subtype") && r.contains("edge_on")));

    let any_empty_class = validate_labels(
        &labels,
        &ValidationThresholds {
            min_class_count: None,
            max_imbalance_ratio: Some(1.0),
        },
    );
    assert_eq!(any_empty_class.outcome, ValidationOutcome::Fail);
    Ok(())
}

#[cfg(feature = "burn-runtime")]
#[test]
fn collates_task_samples_into_tensors() -> anyhow::Result<()> {
    use burn_ndarray::NdArray;
    use galaxy_dataset::{collate, BatchConfig, BatchIter};

    type B = NdArray<f32>;
    let device = <B as burn::tensor::backend::Backend>::Device::default();

    let tmp = tempfile::tempdir()?;
    for id in [100008, 100023, 100053] {
        write_small_png(tmp.path(), id)?;
    }
    let votes = VoteTable::from_reader(GALAXY_ZOO_CSV.as_bytes())?;
    let ids: Vec<u64> = votes.ids().collect();
    let labels = votes.derive_many(&ids)?;
    let records = load_records(&index_images(tmp.path())?, &votes, &small_pipeline())?;
    let dataset = LabeledDataset::new(records, labels)?;

    let samples = dataset.task_samples(Task::Morphology);
    let batch = collate::<B>(&samples, &device)?;
    assert_eq!(batch.images.dims(), [6, 3, 8, 8]);
    assert_eq!(batch.targets.dims(), [6, 2]);
    assert_eq!(batch.galaxy_ids.dims(), [6]);

    let mut iter = BatchIter::new(
        samples,
        BatchConfig {
            shuffle: true,
            seed: Some(7),
            drop_last: true,
        },
    );
    assert_eq!(iter.len(), 6);
    let mut seen = 0;
    while let Some(batch) = iter.next_batch::<B>(4, &device)? {
        assert_eq!(batch.images.dims()[0], 4);
        seen += 1;
    }
    assert_eq!(seen, 1);
    Ok(())
}
