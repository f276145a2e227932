//! Dimension definitions for SCD Type 2 history tables
//!
//! A dimension ties a source snapshot table to a history table keyed by a
//! single business-key column. Definitions live in YAML files under the
//! project's `dimension_paths`.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Names of the validity columns appended to every history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataColumns {
    #[serde(default = "default_valid_from")]
    pub valid_from: String,

    #[serde(default = "default_valid_to")]
    pub valid_to: String,

    #[serde(default = "default_is_current")]
    pub is_current: String,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            valid_from: default_valid_from(),
            valid_to: default_valid_to(),
            is_current: default_is_current(),
        }
    }
}

impl MetadataColumns {
    /// The three metadata column names, for exclusion from content.
    pub fn names(&self) -> [&str; 3] {
        [&self.valid_from, &self.valid_to, &self.is_current].map(String::as_str)
    }
}

fn default_valid_from() -> String {
    "valid_from".to_string()
}

fn default_valid_to() -> String {
    "valid_to".to_string()
}

fn default_is_current() -> String {
    "is_current".to_string()
}

/// Where surrogate keys for a dimension are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurrogateKeyConfig {
    /// Key table (can be schema.table format)
    pub table: String,

    /// Integer column holding the surrogate key
    #[serde(default = "default_surrogate_column")]
    pub column: String,
}

fn default_surrogate_column() -> String {
    "surrogate_key".to_string()
}

/// Which quality failures halt the merge of this dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionQuality {
    #[serde(default = "default_true")]
    pub abort_on_duplicate_keys: bool,

    #[serde(default)]
    pub abort_on_duplicate_rows: bool,
}

impl Default for DimensionQuality {
    fn default() -> Self {
        Self {
            abort_on_duplicate_keys: true,
            abort_on_duplicate_rows: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One dimension from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionConfig {
    /// Dimension name
    pub name: String,

    /// Source snapshot table (can be schema.table format)
    pub source: String,

    /// History table (can be schema.table format)
    pub target: String,

    /// Column that identifies an entity in the source
    pub business_key: String,

    #[serde(default)]
    pub metadata: MetadataColumns,

    #[serde(default)]
    pub surrogate_key: Option<SurrogateKeyConfig>,

    #[serde(default)]
    pub quality: DimensionQuality,

    #[serde(default)]
    pub description: Option<String>,
}

impl DimensionConfig {
    /// Validate the dimension definition
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::DimensionInvalid {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.source.trim().is_empty() {
            return Err(invalid("source cannot be empty"));
        }
        if self.target.trim().is_empty() {
            return Err(invalid("target cannot be empty"));
        }
        if self.business_key.trim().is_empty() {
            return Err(invalid("business_key cannot be empty"));
        }
        if self.source == self.target {
            return Err(invalid("source and target must be different tables"));
        }

        let names = self.metadata.names();
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err(invalid("metadata column names cannot be empty"));
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(invalid("metadata column names must be distinct"));
        }
        if names.contains(&self.business_key.as_str()) {
            return Err(invalid("business_key collides with a metadata column"));
        }

        if let Some(sk) = &self.surrogate_key {
            if sk.table.trim().is_empty() || sk.column.trim().is_empty() {
                return Err(invalid("surrogate_key needs a table and a column"));
            }
            if sk.table == self.target || sk.table == self.source {
                return Err(invalid(
                    "surrogate_key.table must differ from source and target",
                ));
            }
            if sk.column == self.business_key || names.contains(&sk.column.as_str()) {
                return Err(invalid(
                    "surrogate_key.column collides with the business key or metadata",
                ));
            }
        }

        Ok(())
    }
}

/// A dimension file containing one or more dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionFile {
    /// Must be `dimensions` when present
    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,

    pub dimensions: Vec<DimensionConfig>,
}

fn default_version() -> u32 {
    1
}

impl DimensionFile {
    /// Load and validate a dimension file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: DimensionFile = serde_yaml::from_str(&content)?;

        if let Some(kind) = &file.kind {
            if kind != "dimensions" {
                return Err(CoreError::InvalidKind {
                    path: path.display().to_string(),
                    found: kind.clone(),
                });
            }
        }

        for dimension in &file.dimensions {
            dimension.validate()?;
        }

        Ok(file)
    }
}

/// A loaded dimension ready for merging
#[derive(Debug, Clone)]
pub struct Dimension {
    pub name: String,

    /// File the dimension was defined in
    pub path: PathBuf,

    pub config: DimensionConfig,
}

impl Dimension {
    pub fn new(config: DimensionConfig, path: PathBuf) -> Self {
        Self {
            name: config.name.clone(),
            path,
            config,
        }
    }
}

/// Discover dimensions under the given directories, sorted by name.
pub fn discover_dimensions(
    project_root: &Path,
    dimension_paths: &[String],
) -> CoreResult<Vec<Dimension>> {
    let mut dimensions: Vec<Dimension> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for dimension_path in dimension_paths {
        let dir = project_root.join(dimension_path);
        if !dir.exists() {
            log::debug!("Dimension path {} does not exist", dir.display());
            continue;
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext == "yml" || ext == "yaml")
            })
            .collect();
        files.sort();

        for path in files {
            let file = DimensionFile::load(&path)?;
            for config in file.dimensions {
                if let Some(first) = seen.get(&config.name) {
                    return Err(CoreError::DuplicateDimension {
                        name: config.name.clone(),
                        path1: first.display().to_string(),
                        path2: path.display().to_string(),
                    });
                }
                seen.insert(config.name.clone(), path.clone());
                dimensions.push(Dimension::new(config, path.clone()));
            }
        }
    }

    dimensions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dimensions)
}

#[cfg(test)]
#[path = "dimension_test.rs"]
mod tests;
