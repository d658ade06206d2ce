//! Shared data contracts for Galaxy Zoo vote rows.

pub mod votes;

pub use votes::{
    MissingVoteField, ValidationError, VoteField, VoteQuestion, VoteRow, GROUP_SUM_TOLERANCE,
};
