use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("doorbell_settings_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("doorbell.toml");
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_with_env(None, Some(HashMap::new()), None).expect("settings");
    assert_eq!(settings.origin(), DEFAULT_BASE_URL);
    assert_eq!(settings.api_key, None);
    assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert_eq!(settings.history_page_size, 20);
}

#[test]
fn file_values_are_read_and_env_overrides_them() {
    let path = temp_settings_file(
        "base_url = \"http://192.168.0.110:8000/\"\napi_key = \"from-file\"\ntimeout_secs = 3\n",
    );

    let settings =
        load_settings_with_env(Some(&path), Some(HashMap::new()), None).expect("file settings");
    assert_eq!(settings.origin(), "http://192.168.0.110:8000");
    assert_eq!(settings.api_key.as_deref(), Some("from-file"));
    assert_eq!(settings.timeout, Duration::from_secs(3));

    let env = HashMap::from([
        ("APP__BASE_URL".to_string(), "https://door.example".to_string()),
        ("APP__HISTORY_PAGE_SIZE".to_string(), "50".to_string()),
    ]);
    let settings = load_settings_with_env(Some(&path), Some(env), Some("from-env".into()))
        .expect("env settings");
    assert_eq!(settings.origin(), "https://door.example");
    assert_eq!(settings.history_page_size, 50);
    assert_eq!(settings.api_key.as_deref(), Some("from-env"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn missing_explicit_file_is_an_error() {
    let path = env::temp_dir().join("doorbell_settings_missing/doorbell.toml");
    let err = load_settings_with_env(Some(&path), Some(HashMap::new()), None)
        .expect_err("missing file");
    assert!(matches!(err, SettingsError::Load(_)));
}

#[test]
fn rejects_non_http_base_url() {
    let env = HashMap::from([("APP__BASE_URL".to_string(), "ftp://door".to_string())]);
    let err = load_settings_with_env(None, Some(env), None).expect_err("scheme");
    assert!(matches!(err, SettingsError::UnsupportedScheme(_)));

    let env = HashMap::from([("APP__BASE_URL".to_string(), "not a url".to_string())]);
    let err = load_settings_with_env(None, Some(env), None).expect_err("parse");
    assert!(matches!(err, SettingsError::InvalidBaseUrl { .. }));
}

#[test]
fn empty_api_key_counts_as_missing() {
    let settings =
        load_settings_with_env(None, Some(HashMap::new()), Some(String::new())).expect("settings");
    assert_eq!(settings.api_key, None);
}

#[test]
fn debug_output_redacts_api_key() {
    let settings = ClientSettings::new("http://door:8000", Some("s3cret".into())).expect("settings");
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("s3cret"));
    assert!(rendered.contains("<redacted>"));
}
