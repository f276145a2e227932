//! dv-scd - SCD Type 2 history maintenance for dimvault
//!
//! [`Scd2Merger`] reconciles a source snapshot against a history table:
//! bootstrap when the history is absent, otherwise close changed versions
//! and open new ones. [`SurrogateKeyAssigner`] gives every business key a
//! stable integer key that is never reused.

pub mod error;
pub mod keys;
pub mod merge;

pub use error::{ScdError, ScdResult};
pub use keys::{KeyAssignmentOutcome, SurrogateKeyAssigner};
pub use merge::{DimensionState, MergeOutcome, Scd2Merger};
