//! Class-balance checks over derived labels.

use crate::tasks::Task;
use crate::types::{
    ClassCount, LabelSummary, TaskSummary, ValidationOutcome, ValidationReport,
    ValidationThresholds,
};
use galaxy_labels::GalaxyLabels;

pub fn summarize_labels(labels: &[GalaxyLabels]) -> LabelSummary {
    let tasks = Task::ALL
        .into_iter()
        .map(|task| {
            let mut counts = vec![0usize; task.num_classes()];
            for class in labels.iter().filter_map(|l| task.class_of(l)) {
                counts[class] += 1;
            }
            TaskSummary {
                task,
                total: counts.iter().sum(),
                classes: task
                    .class_names()
                    .iter()
                    .zip(counts)
                    .map(|(name, count)| ClassCount {
                        class: name.to_string(),
                        count,
                    })
                    .collect(),
            }
        })
        .collect();
    LabelSummary {
        galaxies: labels.len(),
        tasks,
    }
}

fn apply_thresholds(
    summary: &TaskSummary,
    thresholds: &ValidationThresholds,
    outcome: &mut ValidationOutcome,
    reasons: &mut Vec<String>,
) {
    let label = summary.task.as_str();
    if summary.total == 0 {
        if *outcome == ValidationOutcome::Pass {
            *outcome = ValidationOutcome::Warn;
        }
        reasons.push(format!("{label}: no galaxies"));
        return;
    }
    for class in &summary.classes {
        if class.count == 0 {
            if *outcome == ValidationOutcome::Pass {
                *outcome = ValidationOutcome::Warn;
            }
            reasons.push(format!("{label}: class {} has no galaxies", class.class));
        }
        if let Some(min) = thresholds.min_class_count {
            if class.count < min {
                *outcome = ValidationOutcome::Fail;
                reasons.push(format!(
                    "{label}: class {} has {} galaxies, below min {min}",
                    class.class, class.count
                ));
            }
        }
    }
    if let Some(max_r) = thresholds.max_imbalance_ratio {
        let largest = summary.classes.iter().map(|c| c.count).max().unwrap_or(0);
        let smallest = summary.classes.iter().map(|c| c.count).min().unwrap_or(0);
        let ratio = if smallest == 0 {
            f32::INFINITY
        } else {
            largest as f32 / smallest as f32
        };
        if ratio > max_r {
            *outcome = ValidationOutcome::Fail;
            reasons.push(format!(
                "{label}: imbalance ratio {:.3} exceeds max {:.3}",
                ratio, max_r
            ));
        }
    }
}

pub fn validate_summary(
    summary: LabelSummary,
    thresholds: &ValidationThresholds,
) -> ValidationReport {
    let mut outcome = ValidationOutcome::Pass;
    let mut reasons = Vec::new();
    for task in &summary.tasks {
        apply_thresholds(task, thresholds, &mut outcome, &mut reasons);
    }
    for reason in &reasons {
        tracing::warn!(outcome = outcome.as_str(), "{reason}");
    }
    ValidationReport {
        outcome,
        reasons,
        summary,
    }
}

pub fn validate_labels(
    labels: &[GalaxyLabels],
    thresholds: &ValidationThresholds,
) -> ValidationReport {
    validate_summary(summarize_labels(labels), thresholds)
}
