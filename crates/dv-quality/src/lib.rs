//! dv-quality - Data-quality gate for dimvault
//!
//! Every check writes exactly one row to the log table, then either raises
//! [`QualityError::CheckFailed`] or lets the pipeline continue.

pub mod error;
pub mod gate;

pub use error::{QualityError, QualityResult};
pub use gate::{CheckContext, LogEntry, OnFailure, QualityGate, QualitySummary};
