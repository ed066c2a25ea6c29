use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "HARVEST_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.suppliers_dir.to_str(), Some("./config/suppliers"));
    assert_eq!(cfg.scenarios_dir.to_str(), Some("./config/scenarios"));
    assert_eq!(cfg.output_path.to_str(), Some("./output/records.json"));
    assert_eq!(cfg.webdriver_url, "http://127.0.0.1:4444");
    assert_eq!(cfg.max_pages, 200);
    assert_eq!(cfg.item_delay_ms, 0);
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_secs, 1);
}

#[test]
fn max_pages_override() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MAX_PAGES", "15");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_pages, 15);
}

#[test]
fn max_pages_invalid() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MAX_PAGES", "lots");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_MAX_PAGES"),
        "expected InvalidEnvVar(HARVEST_MAX_PAGES), got: {result:?}"
    );
}

#[test]
fn item_delay_ms_invalid() {
    let mut map = HashMap::new();
    map.insert("HARVEST_ITEM_DELAY_MS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_ITEM_DELAY_MS"),
        "expected InvalidEnvVar(HARVEST_ITEM_DELAY_MS), got: {result:?}"
    );
}

#[test]
fn webdriver_url_must_be_http() {
    let mut map = HashMap::new();
    map.insert("HARVEST_WEBDRIVER_URL", "localhost:4444");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "HARVEST_WEBDRIVER_URL"),
        "expected InvalidEnvVar(HARVEST_WEBDRIVER_URL), got: {result:?}"
    );
}

#[test]
fn retry_settings_override() {
    let mut map = HashMap::new();
    map.insert("HARVEST_MAX_RETRIES", "0");
    map.insert("HARVEST_RETRY_BACKOFF_BASE_SECS", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_retries, 0);
    assert_eq!(cfg.retry_backoff_base_secs, 3);
}

#[test]
fn catalog_path_falls_back_to_yaml_name() {
    let mut map = HashMap::new();
    map.insert("HARVEST_SUPPLIERS_DIR", "/nonexistent/suppliers");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.catalog_path("acme"),
        std::path::PathBuf::from("/nonexistent/suppliers/acme.yaml")
    );
}
