use std::{env, fs, time::Duration};

use cloudsvc_provider::config::loader::{load_config, read_config};

#[test]
fn config_file_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("cloudsvc.toml");

    let toml_content = r#"
[api]
url = "https://api.staging.example.com"
token = "file-token"

[timeouts]
create_secs = 900

[polling]
initial_interval_ms = 1000
max_interval_ms = 8000
backoff_factor = 2.0

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) File values are read, missing ones fall back to defaults
    let cfg = load_config(Some(&path)).expect("should parse config");
    assert_eq!(cfg.api.url, "https://api.staging.example.com");
    assert_eq!(cfg.api.token.as_ref().map(|t| t.expose()), Some("file-token"));
    assert_eq!(cfg.timeouts.create(), Duration::from_secs(900));
    assert_eq!(cfg.timeouts.update(), Duration::from_secs(1200));
    assert_eq!(cfg.polling.policy().max_interval, Duration::from_secs(8));
    assert_eq!(cfg.polling.not_found_checks, 20);
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env overrides win over the file
    unsafe {
        env::set_var("CLOUDSVC__POLLING__INITIAL_INTERVAL_MS", "250");
    }
    let cfg_env = load_config(Some(&path)).expect("should parse config with env overrides");
    assert_eq!(cfg_env.polling.initial_interval_ms, 250);
    unsafe {
        env::remove_var("CLOUDSVC__POLLING__INITIAL_INTERVAL_MS");
    }

    // 3) A missing file yields the defaults
    let cfg_default = load_config(Some(&dir.path().join("absent.toml"))).expect("defaults");
    assert_eq!(cfg_default.api.url, "https://api.aiven.io");
    assert!(cfg_default.api.token.is_none());

    // 4) Invalid values are rejected
    let invalid_path = dir.path().join("invalid.toml");
    fs::write(
        &invalid_path,
        r#"
[polling]
initial_interval_ms = 5000
max_interval_ms = 1000
"#,
    )
    .expect("write invalid toml");
    let err = load_config(Some(&invalid_path)).expect_err("expected validation error");
    assert!(err.to_string().contains("max_interval_ms"));
}

#[test]
fn read_config_defers_validation_to_the_caller() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("cloudsvc.toml");
    fs::write(&path, "[api]\nurl = \"not a url\"\n").expect("write toml");

    assert!(load_config(Some(&path)).is_err());

    let mut cfg = read_config(Some(&path)).expect("unvalidated config");
    assert_eq!(cfg.api.url, "not a url");
    cfg.api.url = "https://api.example.com".into();
    cfg.validate().expect("override makes the config valid");
}
