//! Label variants, one-hot encodings, and the derivation error taxonomy.

use data_contracts::{MissingVoteField, VoteField};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type LabelResult<T> = Result<T, LabelError>;

/// Precondition violations in the vote data. None of these are retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("galaxy {galaxy_id} has no row in the vote table")]
    UnknownIdentifier { galaxy_id: u64 },
    #[error("galaxy {galaxy_id}: vote field {field} missing")]
    MissingField { galaxy_id: u64, field: VoteField },
    #[error("galaxy {galaxy_id}: {denominator} is zero on the branch that divides by it")]
    DivisionByZero {
        galaxy_id: u64,
        denominator: VoteField,
    },
}

impl LabelError {
    pub fn galaxy_id(&self) -> u64 {
        match self {
            LabelError::UnknownIdentifier { galaxy_id }
            | LabelError::MissingField { galaxy_id, .. }
            | LabelError::DivisionByZero { galaxy_id, .. } => *galaxy_id,
        }
    }
}

impl From<MissingVoteField> for LabelError {
    fn from(e: MissingVoteField) -> Self {
        LabelError::MissingField {
            galaxy_id: e.galaxy_id,
            field: e.field,
        }
    }
}

fn one_hot<const N: usize>(index: usize) -> [f32; N] {
    let mut out = [0.0; N];
    out[index] = 1.0;
    out
}

/// Result of the elliptical-vs-spiral decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryClass {
    Elliptical,
    Spiral,
}

impl BinaryClass {
    pub const NAMES: [&'static str; 2] = ["elliptical", "spiral"];

    pub fn index(&self) -> usize {
        match self {
            BinaryClass::Elliptical => 0,
            BinaryClass::Spiral => 1,
        }
    }

    /// `[1,0]` for elliptical, `[0,1]` for spiral.
    pub fn one_hot(&self) -> [f32; 2] {
        one_hot(self.index())
    }

    pub fn as_str(&self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiralSubtype {
    /// Disk seen edge-on; bar presence cannot be judged.
    EdgeOn,
    NotBarred,
    Barred,
}

impl SpiralSubtype {
    pub const NAMES: [&'static str; 3] = ["edge_on", "not_barred", "barred"];

    pub fn index(&self) -> usize {
        match self {
            SpiralSubtype::EdgeOn => 0,
            SpiralSubtype::NotBarred => 1,
            SpiralSubtype::Barred => 2,
        }
    }

    pub fn one_hot(&self) -> [f32; 3] {
        one_hot(self.index())
    }

    pub fn as_str(&self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

/// Hubble ellipticity bucket for smooth galaxies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EllipticalSubtype {
    /// E0–E1, completely round.
    Round,
    /// E2–E5.
    InBetween,
    /// E6–E7, cigar shaped.
    Cigar,
}

impl EllipticalSubtype {
    pub const NAMES: [&'static str; 3] = ["round", "in_between", "cigar"];

    pub fn index(&self) -> usize {
        match self {
            EllipticalSubtype::Round => 0,
            EllipticalSubtype::InBetween => 1,
            EllipticalSubtype::Cigar => 2,
        }
    }

    pub fn one_hot(&self) -> [f32; 3] {
        one_hot(self.index())
    }

    pub fn as_str(&self) -> &'static str {
        Self::NAMES[self.index()]
    }
}

/// Binary branch refined into exactly one sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "morphology", content = "subtype", rename_all = "snake_case")]
pub enum Morphology {
    Elliptical(EllipticalSubtype),
    Spiral(SpiralSubtype),
}

impl Morphology {
    pub fn binary(&self) -> BinaryClass {
        match self {
            Morphology::Elliptical(_) => BinaryClass::Elliptical,
            Morphology::Spiral(_) => BinaryClass::Spiral,
        }
    }

    pub fn subtype_name(&self) -> &'static str {
        match self {
            Morphology::Elliptical(sub) => sub.as_str(),
            Morphology::Spiral(sub) => sub.as_str(),
        }
    }
}

/// Every target derived for one galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GalaxyLabels {
    pub galaxy_id: u64,
    #[serde(flatten)]
    pub morphology: Morphology,
}

impl GalaxyLabels {
    pub fn binary(&self) -> BinaryClass {
        self.morphology.binary()
    }

    pub fn binary_target(&self) -> [f32; 2] {
        self.binary().one_hot()
    }

    pub fn spiral_target(&self) -> Option<[f32; 3]> {
        match self.morphology {
            Morphology::Spiral(sub) => Some(sub.one_hot()),
            Morphology::Elliptical(_) => None,
        }
    }

    pub fn elliptical_target(&self) -> Option<[f32; 3]> {
        match self.morphology {
            Morphology::Elliptical(sub) => Some(sub.one_hot()),
            Morphology::Spiral(_) => None,
        }
    }
}
