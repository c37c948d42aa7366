//! Tests for loading experiment settings from disk.

use shapeworld::ExperimentConfig;
use shapeworld_core::{PatternVariant, ShapeSkin};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
transition_delay_ms = 250
pattern_variant = "simple"
shape_skin = "star"
participant_id = "p-03"
"#
    )
    .expect("written");

    let config = ExperimentConfig::from_file(file.path()).expect("loads");
    assert_eq!(config.transition_delay(), Duration::from_millis(250));
    assert_eq!(*config.pattern_variant(), PatternVariant::Simple);
    assert_eq!(*config.shape_skin(), ShapeSkin::Star);
    assert_eq!(config.participant_id().as_deref(), Some("p-03"));

    let domain = config.pursuit_domain().expect("domain");
    assert_eq!(domain.patterns().len(), 2);
    assert!(config.transition_rule().expect("rule").check_domain(&domain).is_ok());
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = ExperimentConfig::from_file(dir.path().join("absent.toml"));
    let err = result.expect_err("missing file");
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "menu_rows = \"three\"").expect("written");
    let err = ExperimentConfig::from_file(file.path()).expect_err("bad type");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_menu_dimensions_must_fit_domain() {
    let config = ExperimentConfig::from_toml("menu_rows = 2\nmenu_cols = 9").expect("parses");
    let domain = config.builder_domain().expect("domain");
    let mut rng = config.random_source();
    let result = shapeworld_core::MenuLayout::generate(
        &domain,
        *config.menu_rows(),
        config.menu_columns(),
        rng.as_mut(),
    );
    assert!(result.is_err());
}
