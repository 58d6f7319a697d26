// Configuration loading from files and the environment

use postasy::compositor::LogoPosition;
use postasy::config::Config;
use postasy::storage::StorageLayout;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
storage:
  upload_root: /data/uploads
generation:
  retry:
    max_attempts: 4
    initial_backoff_ms: 500
    max_backoff_ms: 1500
watermark:
  jpeg_quality: 80
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());

    let policy = config.generation.retry.to_retry_policy();
    assert_eq!(policy.max_attempts, 4);
    assert_eq!(policy.backoff_duration(1), Duration::from_millis(500));
    assert_eq!(policy.backoff_duration(2), Duration::from_millis(1000));
    assert_eq!(policy.backoff_duration(3), Duration::from_millis(1500));

    let layout = StorageLayout::from_config(&config.storage);
    assert_eq!(
        layout.poster_path("p.jpg"),
        PathBuf::from("/data/uploads/posters/p.jpg")
    );
}

#[test]
fn test_missing_config_file() {
    let err = Config::from_file("/definitely/not/here/postasy.yaml").unwrap_err();
    assert!(err.contains("Failed to read config file"));
}

#[test]
fn test_invalid_yaml_is_reported() {
    assert!(Config::from_yaml_with_env("generation: [not, a, map]").is_err());
}

#[test]
fn test_api_key_from_environment_variable_placeholder() {
    std::env::set_var("POSTASY_CONFIG_TEST_KEY", "from-env-key");
    let config =
        Config::from_yaml_with_env("generation:\n  api_key: ${POSTASY_CONFIG_TEST_KEY}\n").unwrap();
    assert_eq!(
        config.generation.resolve_api_key().as_deref(),
        Some("from-env-key")
    );
}

#[test]
fn test_default_retry_schedule() {
    let policy = Config::default().generation.retry.to_retry_policy();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.backoff_duration(0), Duration::ZERO);
    assert_eq!(policy.backoff_duration(1), Duration::from_secs(2));
    assert_eq!(policy.backoff_duration(2), Duration::from_secs(4));
}

#[test]
fn test_unknown_position_defaults_to_top_right() {
    let position: LogoPosition = "middle-ish".parse().unwrap();
    assert_eq!(position, LogoPosition::TopRight);
}
