//! Galaxy morphology label derivation.
//!
//! Turns Galaxy Zoo crowd-vote fractions into one-hot targets for three tasks:
//! - elliptical vs. spiral
//! - spiral sub-type (edge-on, not barred, barred)
//! - elliptical sub-type (E0–E1, E2–E5, E6–E7)
//!
//! The binary decision routes every galaxy into exactly one sub-type task, which
//! `Morphology` encodes directly.

pub mod derive;
pub mod table;
pub mod types;

pub use derive::{
    derive, derive_binary, derive_elliptical_subtype, derive_labels, derive_spiral_subtype,
    BAR_EPSILON,
};
pub use table::{VoteTable, VoteTableError};
pub use types::*;

pub use data_contracts::{VoteField, VoteRow};
