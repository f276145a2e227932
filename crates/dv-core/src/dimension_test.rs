use super::*;
use std::io::Write;
use tempfile::TempDir;

fn movie_dimension() -> DimensionConfig {
    DimensionConfig {
        name: "dim_movie".to_string(),
        source: "landing.movies".to_string(),
        target: "history.dim_movie".to_string(),
        business_key: "movie_id".to_string(),
        metadata: MetadataColumns::default(),
        surrogate_key: None,
        quality: DimensionQuality::default(),
        description: None,
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn test_valid_dimension() {
    assert!(movie_dimension().validate().is_ok());
}

#[test]
fn test_empty_business_key_rejected() {
    let mut config = movie_dimension();
    config.business_key = " ".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("business_key"));
}

#[test]
fn test_source_equals_target_rejected() {
    let mut config = movie_dimension();
    config.target = config.source.clone();
    assert!(config.validate().is_err());
}

#[test]
fn test_business_key_colliding_with_metadata_rejected() {
    let mut config = movie_dimension();
    config.business_key = "valid_from".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_duplicate_metadata_names_rejected() {
    let mut config = movie_dimension();
    config.metadata.valid_to = "valid_from".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_surrogate_column_collision_rejected() {
    let mut config = movie_dimension();
    config.surrogate_key = Some(SurrogateKeyConfig {
        table: "keys.movie_keys".to_string(),
        column: "is_current".to_string(),
    });
    assert!(config.validate().is_err());
}

#[test]
fn test_load_yaml_with_defaults() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "movies.yml",
        r#"
kind: dimensions
dimensions:
  - name: dim_movie
    source: landing.movies
    target: history.dim_movie
    business_key: movie_id
    surrogate_key:
      table: keys.movie_keys
    description: Movie releases
"#,
    );

    let file = DimensionFile::load(&path).unwrap();
    assert_eq!(file.version, 1);
    let dim = &file.dimensions[0];
    assert_eq!(dim.metadata, MetadataColumns::default());
    assert_eq!(dim.metadata.names(), ["valid_from", "valid_to", "is_current"]);
    assert_eq!(dim.surrogate_key.as_ref().unwrap().column, "surrogate_key");
    assert!(dim.quality.abort_on_duplicate_keys);
    assert!(!dim.quality.abort_on_duplicate_rows);
}

#[test]
fn test_load_rejects_wrong_kind() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "bad.yml",
        "kind: sources\ndimensions: []\n",
    );
    let err = DimensionFile::load(&path).unwrap_err();
    assert!(matches!(err, CoreError::InvalidKind { .. }));
}

#[test]
fn test_load_rejects_unknown_fields() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        temp.path(),
        "bad.yml",
        r#"
dimensions:
  - name: d
    source: a
    target: b
    business_key: id
    strategy: timestamp
"#,
    );
    assert!(DimensionFile::load(&path).is_err());
}

#[test]
fn test_discover_sorted_and_skips_missing_dirs() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("dimensions");
    std::fs::create_dir(&dir).unwrap();
    write_file(
        &dir,
        "b.yml",
        "dimensions:\n  - {name: dim_studio, source: l.s, target: h.s, business_key: id}\n",
    );
    write_file(
        &dir,
        "a.yaml",
        "dimensions:\n  - {name: dim_actor, source: l.a, target: h.a, business_key: id}\n",
    );
    write_file(&dir, "notes.txt", "ignored");

    let found = discover_dimensions(
        temp.path(),
        &["dimensions".to_string(), "missing".to_string()],
    )
    .unwrap();
    let names: Vec<&str> = found.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["dim_actor", "dim_studio"]);
}

#[test]
fn test_discover_rejects_duplicate_names() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("dimensions");
    std::fs::create_dir(&dir).unwrap();
    let body = "dimensions:\n  - {name: dim_movie, source: l.m, target: h.m, business_key: id}\n";
    write_file(&dir, "one.yml", body);
    write_file(&dir, "two.yml", body);

    let err = discover_dimensions(temp.path(), &["dimensions".to_string()]).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateDimension { .. }));
}
