use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Slack allowed when a question group's fractions are summed.
pub const GROUP_SUM_TOLERANCE: f64 = 1e-3;

/// Galaxy Zoo decision-tree questions the label deriver consults.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VoteQuestion {
    /// Class 1: smooth and rounded vs. features or disk.
    Shape,
    /// Class 2: disk viewed edge-on.
    EdgeOn,
    /// Class 3: bar feature through the centre.
    Bar,
    /// Class 7: how rounded a smooth galaxy is.
    Roundness,
}

impl VoteQuestion {
    pub fn fields(&self) -> &'static [VoteField] {
        match self {
            VoteQuestion::Shape => &[VoteField::Elliptical, VoteField::Spiral],
            VoteQuestion::EdgeOn => &[VoteField::EdgeOn, VoteField::NotEdgeOn],
            VoteQuestion::Bar => &[VoteField::Bar, VoteField::NoBar],
            VoteQuestion::Roundness => &[VoteField::Round, VoteField::InBetween, VoteField::Cigar],
        }
    }
}

/// Named vote-fraction columns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VoteField {
    #[serde(rename = "elliptical_frac")]
    Elliptical,
    #[serde(rename = "spiral_frac")]
    Spiral,
    #[serde(rename = "edge_on_frac")]
    EdgeOn,
    #[serde(rename = "not_edge_on_frac")]
    NotEdgeOn,
    #[serde(rename = "bar_frac")]
    Bar,
    #[serde(rename = "no_bar_frac")]
    NoBar,
    #[serde(rename = "round_frac")]
    Round,
    #[serde(rename = "inbetween_frac")]
    InBetween,
    #[serde(rename = "cigar_frac")]
    Cigar,
}

impl VoteField {
    pub const ALL: [VoteField; 9] = [
        VoteField::Elliptical,
        VoteField::Spiral,
        VoteField::EdgeOn,
        VoteField::NotEdgeOn,
        VoteField::Bar,
        VoteField::NoBar,
        VoteField::Round,
        VoteField::InBetween,
        VoteField::Cigar,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            VoteField::Elliptical => "elliptical_frac",
            VoteField::Spiral => "spiral_frac",
            VoteField::EdgeOn => "edge_on_frac",
            VoteField::NotEdgeOn => "not_edge_on_frac",
            VoteField::Bar => "bar_frac",
            VoteField::NoBar => "no_bar_frac",
            VoteField::Round => "round_frac",
            VoteField::InBetween => "inbetween_frac",
            VoteField::Cigar => "cigar_frac",
        }
    }

    /// Column header used by the Galaxy Zoo `training_solutions` CSV.
    pub fn galaxy_zoo_column(&self) -> &'static str {
        match self {
            VoteField::Elliptical => "Class1.1",
            VoteField::Spiral => "Class1.2",
            VoteField::EdgeOn => "Class2.1",
            VoteField::NotEdgeOn => "Class2.2",
            VoteField::Bar => "Class3.1",
            VoteField::NoBar => "Class3.2",
            VoteField::Round => "Class7.1",
            VoteField::InBetween => "Class7.2",
            VoteField::Cigar => "Class7.3",
        }
    }

    pub fn question(&self) -> VoteQuestion {
        match self {
            VoteField::Elliptical | VoteField::Spiral => VoteQuestion::Shape,
            VoteField::EdgeOn | VoteField::NotEdgeOn => VoteQuestion::EdgeOn,
            VoteField::Bar | VoteField::NoBar => VoteQuestion::Bar,
            VoteField::Round | VoteField::InBetween | VoteField::Cigar => VoteQuestion::Roundness,
        }
    }

    /// Resolve a CSV header (canonical name or Galaxy Zoo column) to a field.
    pub fn from_column(header: &str) -> Option<Self> {
        let header = header.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.canonical_name() == header || f.galaxy_zoo_column() == header)
    }
}

impl fmt::Display for VoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Crowd-vote fractions for a single galaxy. Absent fields stay absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRow {
    pub galaxy_id: u64,
    pub fractions: BTreeMap<VoteField, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("galaxy {galaxy_id}: vote field {field} missing")]
pub struct MissingVoteField {
    pub galaxy_id: u64,
    pub field: VoteField,
}

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("galaxy {galaxy_id}: {field} is not finite ({value})")]
    NonFinite {
        galaxy_id: u64,
        field: VoteField,
        value: f64,
    },
    #[error("galaxy {galaxy_id}: {field} out of [0,1] ({value})")]
    OutOfRange {
        galaxy_id: u64,
        field: VoteField,
        value: f64,
    },
    #[error("galaxy {galaxy_id}: {question:?} fractions sum to {sum:.4}")]
    GroupSum {
        galaxy_id: u64,
        question: VoteQuestion,
        sum: f64,
    },
}

impl VoteRow {
    pub fn new(galaxy_id: u64) -> Self {
        Self {
            galaxy_id,
            fractions: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: VoteField, value: f64) -> Self {
        self.fractions.insert(field, value);
        self
    }

    pub fn set(&mut self, field: VoteField, value: f64) {
        self.fractions.insert(field, value);
    }

    pub fn get(&self, field: VoteField) -> Option<f64> {
        self.fractions.get(&field).copied()
    }

    pub fn require(&self, field: VoteField) -> Result<f64, MissingVoteField> {
        self.get(field).ok_or(MissingVoteField {
            galaxy_id: self.galaxy_id,
            field,
        })
    }

    /// Range-check present values and make sure complete question groups do not exceed 1.
    ///
    /// Groups may sum below 1: question 1 has a star/artifact answer that is not carried here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (&field, &value) in &self.fractions {
            if !value.is_finite() {
                return Err(ValidationError::NonFinite {
                    galaxy_id: self.galaxy_id,
                    field,
                    value,
                });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::OutOfRange {
                    galaxy_id: self.galaxy_id,
                    field,
                    value,
                });
            }
        }
        for question in [
            VoteQuestion::Shape,
            VoteQuestion::EdgeOn,
            VoteQuestion::Bar,
            VoteQuestion::Roundness,
        ] {
            let values: Option<Vec<f64>> = question.fields().iter().map(|f| self.get(*f)).collect();
            let Some(values) = values else { continue };
            let sum: f64 = values.iter().sum();
            if sum > 1.0 + GROUP_SUM_TOLERANCE {
                return Err(ValidationError::GroupSum {
                    galaxy_id: self.galaxy_id,
                    question,
                    sum,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_resolve_both_spellings() {
        assert_eq!(VoteField::from_column("Class2.2"), Some(VoteField::NotEdgeOn));
        assert_eq!(VoteField::from_column(" cigar_frac "), Some(VoteField::Cigar));
        assert_eq!(VoteField::from_column("Class1.3"), None);
    }

    #[test]
    fn every_field_belongs_to_its_question() {
        for field in VoteField::ALL {
            assert!(field.question().fields().contains(&field));
        }
    }
}
