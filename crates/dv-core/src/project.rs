//! Project discovery and loading

use crate::config::Config;
use crate::dimension::{discover_dimensions, Dimension};
use crate::error::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// A dimvault project: config plus the dimensions it defines
#[derive(Debug)]
pub struct Project {
    /// Project root directory
    pub root: PathBuf,

    /// Project configuration
    pub config: Config,

    /// Dimensions discovered under `dimension_paths`, sorted by name
    pub dimensions: Vec<Dimension>,
}

impl Project {
    /// Load a project from its root directory
    pub fn load(root: &Path) -> CoreResult<Self> {
        if !root.is_dir() {
            return Err(CoreError::ConfigNotFound {
                path: root.display().to_string(),
            });
        }

        let config = Config::load_from_dir(root)?;
        let dimensions = discover_dimensions(root, &config.dimension_paths)?;
        log::debug!(
            "Loaded project '{}' with {} dimensions",
            config.name,
            dimensions.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            config,
            dimensions,
        })
    }

    /// Look up a dimension by name
    pub fn get_dimension(&self, name: &str) -> CoreResult<&Dimension> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| CoreError::DimensionNotFound {
                name: name.to_string(),
            })
    }

    /// Directory that run result files are written to
    pub fn target_dir(&self) -> PathBuf {
        self.config.target_path_absolute(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_project_with_dimensions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("dimvault.yml"), "name: movies\n").unwrap();
        std::fs::create_dir(temp.path().join("dimensions")).unwrap();
        std::fs::write(
            temp.path().join("dimensions/movie.yml"),
            "dimensions:\n  - {name: dim_movie, source: landing.movies, target: history.dim_movie, business_key: movie_id}\n",
        )
        .unwrap();

        let project = Project::load(temp.path()).unwrap();
        assert_eq!(project.config.name, "movies");
        assert_eq!(project.dimensions.len(), 1);
        assert_eq!(
            project.get_dimension("dim_movie").unwrap().config.business_key,
            "movie_id"
        );
        assert!(project.get_dimension("dim_studio").is_err());
        assert_eq!(project.target_dir(), temp.path().join("target"));
    }

    #[test]
    fn test_load_missing_root() {
        assert!(Project::load(Path::new("/definitely/not/here")).is_err());
    }
}
