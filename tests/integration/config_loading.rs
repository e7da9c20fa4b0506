use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use ztree::config::{ConfigLoader, StoreBackend};

#[test]
fn explicit_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[store]
backend = "memory"

[session]
session_timeout_ms = 4000
delete_timeout_ms = 1500

[logging]
level = "debug"
output = "stderr"
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_with_file(&config_path).unwrap();

    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.session.session_timeout(), Duration::from_millis(4000));
    assert_eq!(config.session.delete_timeout(), Some(Duration::from_millis(1500)));
    assert_eq!(config.session.connect_string, "hadoop100:2181");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ConfigLoader::load_with_file(&temp_dir.path().join("absent.toml"));
    assert!(result.is_err());
}
