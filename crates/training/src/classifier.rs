//! Narrow interface to an external classifier and the metrics used to score it.

use galaxy_dataset::TaskSample;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Probability clamp used by the cross-entropy loss.
pub const PROB_EPSILON: f64 = 1e-7;

/// Anything that maps one CHW image to per-class probabilities.
pub trait Classifier {
    fn num_classes(&self) -> usize;
    fn predict(&self, image_chw: &[f32], width: u32, height: u32) -> Vec<f32>;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("galaxy {galaxy_id}: expected {expected} probabilities, got {got}")]
    WidthMismatch {
        galaxy_id: u64,
        expected: usize,
        got: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalReport {
    pub samples: usize,
    /// Mean binary cross-entropy over every output unit.
    pub loss: f64,
    /// Fraction of samples whose argmax matches the target.
    pub accuracy: f64,
    /// `confusion[target][predicted]`.
    pub confusion: Vec<Vec<usize>>,
}

#[derive(Debug, Clone)]
pub struct EvalAccumulator {
    num_classes: usize,
    samples: usize,
    correct: usize,
    loss_sum: f64,
    confusion: Vec<Vec<usize>>,
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best_i, best), (i, &v)| {
            if v > best {
                (i, v)
            } else {
                (best_i, best)
            }
        })
        .0
}

impl EvalAccumulator {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            samples: 0,
            correct: 0,
            loss_sum: 0.0,
            confusion: vec![vec![0; num_classes]; num_classes],
        }
    }

    pub fn push(
        &mut self,
        galaxy_id: u64,
        probabilities: &[f32],
        target: &[f32],
    ) -> Result<(), EvalError> {
        for width in [probabilities.len(), target.len()] {
            if width != self.num_classes {
                return Err(EvalError::WidthMismatch {
                    galaxy_id,
                    expected: self.num_classes,
                    got: width,
                });
            }
        }
        let bce: f64 = probabilities
            .iter()
            .zip(target)
            .map(|(&p, &t)| {
                let p = (p as f64).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON);
                let t = t as f64;
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum();
        self.loss_sum += bce / self.num_classes as f64;

        let predicted = argmax(probabilities);
        let actual = argmax(target);
        if predicted == actual {
            self.correct += 1;
        }
        self.confusion[actual][predicted] += 1;
        self.samples += 1;
        Ok(())
    }

    pub fn report(&self) -> EvalReport {
        let n = self.samples.max(1) as f64;
        EvalReport {
            samples: self.samples,
            loss: self.loss_sum / n,
            accuracy: self.correct as f64 / n,
            confusion: self.confusion.clone(),
        }
    }
}

/// Run `classifier` over every sample and score it against the sample targets.
pub fn evaluate<C: Classifier + ?Sized>(
    classifier: &C,
    samples: &[TaskSample<'_>],
) -> Result<EvalReport, EvalError> {
    let mut acc = EvalAccumulator::new(classifier.num_classes());
    for sample in samples {
        let record = sample.record;
        let probs = classifier.predict(&record.image_chw, record.width, record.height);
        acc.push(record.galaxy_id, &probs, &sample.target)?;
    }
    tracing::debug!(samples = samples.len(), "evaluated classifier");
    Ok(acc.report())
}
