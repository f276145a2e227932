//! CLI command implementations

pub(crate) mod common;
pub(crate) mod keys;
pub(crate) mod load;
pub(crate) mod log;
pub(crate) mod merge;
