//! Integration tests for layered configuration
//!
//! Precedence: environment variables > config file > defaults

use leafmap_core::config::{ConfigSource, LayeredConfig};
use leafmap_core::LeafError;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var("LEAFMAP_SCORING_URL");
    env::remove_var("LEAFMAP_REQUEST_TIMEOUT_SECS");
    env::remove_var("LEAFMAP_DEFAULT_INTERVENTION");
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.scoring_url.value, "http://localhost:5000/api");
    assert_eq!(config.scoring_url.source, ConfigSource::Default);
    assert_eq!(config.request_timeout_secs.value, 30);
    assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    assert!(config.default_intervention.value.is_none());
}

#[test]
fn test_file_overrides_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
scoring_url = "https://scoring.example.org/api/"
request_timeout_secs = 0
default_intervention = "Farm Ponds"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.scoring_url.value, "https://scoring.example.org/api");
    assert_eq!(config.scoring_url.source, ConfigSource::File);
    assert_eq!(config.request_timeout(), None);
    assert_eq!(config.request_timeout_secs.source, ConfigSource::File);
    assert_eq!(config.default_intervention.value.as_deref(), Some("Farm Ponds"));
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "request_timeout_secs = 5").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.request_timeout_secs.value, 5);
    assert_eq!(config.scoring_url.source, ConfigSource::Default);
    assert_eq!(config.default_intervention.source, ConfigSource::Default);
}

#[test]
fn test_invalid_file_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"scoring_url = "ftp://scoring""#).unwrap();
    let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, LeafError::ConfigInvalid { .. }));

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "request_timeout_secs = [").unwrap();
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());

    assert!(LayeredConfig::with_defaults().load_from_file("/nonexistent/leafmap.toml").is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("LEAFMAP_SCORING_URL", "http://10.0.0.5:5000/api");
    env::set_var("LEAFMAP_REQUEST_TIMEOUT_SECS", "12");
    env::set_var("LEAFMAP_DEFAULT_INTERVENTION", "Check Dams");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
scoring_url = "http://file-host/api"
request_timeout_secs = 3
default_intervention = "Farm Ponds"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.scoring_url.value, "http://10.0.0.5:5000/api");
    assert_eq!(config.scoring_url.source, ConfigSource::Environment);
    assert_eq!(config.request_timeout_secs.value, 12);
    assert_eq!(config.default_intervention.value.as_deref(), Some("Check Dams"));
    assert_eq!(config.default_intervention.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("LEAFMAP_SCORING_URL", "not-a-url");
    env::set_var("LEAFMAP_REQUEST_TIMEOUT_SECS", "soon");
    env::set_var("LEAFMAP_DEFAULT_INTERVENTION", "   ");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.scoring_url.source, ConfigSource::Default);
    assert_eq!(config.request_timeout_secs.value, 30);
    assert!(config.default_intervention.value.is_none());

    clear_env();
}

#[test]
fn test_precedence_levels() {
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    let map = LayeredConfig::with_defaults().to_inspection_map();
    assert_eq!(map["default_intervention"].0, "(first)");
    assert_eq!(map["request_timeout_secs"], ("30".to_string(), ConfigSource::Default));
}
