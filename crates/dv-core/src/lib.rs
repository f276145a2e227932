//! dv-core - Core library for dimvault
//!
//! Shared types for maintaining SCD Type 2 dimension history: project and
//! dimension configuration, the in-memory row model, the relational algebra
//! the merge is written in, content fingerprints, surrogate-key allocation,
//! and the pure data-quality checks.

pub mod clock;
pub mod config;
pub mod dimension;
pub mod error;
pub mod fingerprint;
pub mod project;
pub mod quality;
pub mod relation;
pub mod sql_utils;
pub mod surrogate;
pub mod value;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, DbType};
pub use dimension::{
    discover_dimensions, Dimension, DimensionConfig, DimensionQuality, MetadataColumns,
    SurrogateKeyConfig,
};
pub use error::{CoreError, CoreResult};
pub use fingerprint::{ChangeHasher, Fingerprint};
pub use project::Project;
pub use quality::{CheckKind, CheckOutcome, CheckStatus};
pub use relation::{Join, JoinKind, Operand, Predicate, Relation, Select, SelectItem, Statement};
pub use surrogate::{Assignment, SurrogateKeyMap};
pub use value::{RowSet, Value};
