//! Keys command implementation - surrogate keys for today's versions

use anyhow::{bail, Context, Result};
use dv_scd::SurrogateKeyAssigner;

use crate::cli::{GlobalArgs, KeysArgs};
use crate::commands::common;

/// Execute the keys command
pub async fn execute(args: &KeysArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let dimension = project.get_dimension(&args.dimension)?;
    if dimension.config.surrogate_key.is_none() {
        bail!(
            "Dimension '{}' has no surrogate_key configured",
            dimension.name
        );
    }

    let db = common::create_database_connection(&project, global.target.as_deref())?;
    let clock = common::build_clock(global);

    if !db.relation_exists(&dimension.config.target).await? {
        bail!(
            "History table '{}' does not exist; run `dv merge` first",
            dimension.config.target
        );
    }

    let assigned = SurrogateKeyAssigner::new(db.as_ref(), clock.as_ref())
        .assign_opened_today(&dimension.config)
        .await
        .with_context(|| format!("Failed to assign surrogate keys for {}", dimension.name))?;

    if let Some(outcome) = assigned {
        println!(
            "  ✓ {} -> {} (rows: {}, new keys: {}, reused: {}, max key: {})",
            dimension.name,
            outcome.table,
            outcome.rows,
            outcome.minted,
            outcome.reused,
            outcome.max_key
        );
    }

    Ok(())
}
