//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dv_core::{Clock, Config, FixedClock, Project, SystemClock};
use dv_db::{Database, DuckDbBackend};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs downcasts it and prints nothing.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Status of one dimension in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RunStatus {
    Success,
    Error,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Error => write!(f, "error"),
        }
    }
}

/// Load the project named by `--project-dir`.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    Project::load(Path::new(&global.project_dir)).context("Failed to load project")
}

/// Open the database for the resolved target (`--target`, then `DV_TARGET`).
///
/// A relative database path is taken relative to the project root.
pub(crate) fn create_database_connection(
    project: &Project,
    target: Option<&str>,
) -> Result<Arc<dyn Database>> {
    let resolved_target = Config::resolve_target(target);
    let db_config = project
        .config
        .get_database_config(resolved_target.as_deref())
        .context("Failed to get database configuration")?;
    let path = if db_config.path == ":memory:" || Path::new(&db_config.path).is_absolute() {
        db_config.path
    } else {
        project.root.join(&db_config.path).display().to_string()
    };
    let db: Arc<dyn Database> =
        Arc::new(DuckDbBackend::new(&path).context("Failed to connect to database")?);
    Ok(db)
}

/// `--as-of` pins today's date; otherwise the local wall clock is used.
pub(crate) fn build_clock(global: &GlobalArgs) -> Box<dyn Clock> {
    match global.as_of {
        Some(date) => Box::new(FixedClock::new(date)),
        None => Box::new(SystemClock),
    }
}

/// `--run-name`, or a fresh `dv-<uuid>` identifier.
pub(crate) fn run_name(global: &GlobalArgs) -> String {
    global
        .run_name
        .clone()
        .unwrap_or_else(|| format!("dv-{}", uuid::Uuid::new_v4()))
}
