//! Configuration loading and validation tests

use toolbridge::config::{Config, TokenSourceConfig};

fn parse(yaml: &str) -> Config {
    serde_yaml::from_str(yaml).expect("config should parse")
}

#[test]
fn test_minimal_config_parses_with_defaults() {
    let config = parse(
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
app_id: "my-app"
"#,
    );

    assert_eq!(config.endpoint, "https://api.example.com");
    assert_eq!(config.environment, "development");
    assert_eq!(config.call_ready_timeout_secs, 30);
    assert_eq!(config.request_timeout_secs, 30);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.ttl_hours, 24);
    assert!(config.auth.is_none());
    config.validate().expect("minimal config should validate");
}

#[test]
fn test_full_config_parses() {
    let config = parse(
        r#"
endpoint: "https://api.example.com/"
app_id: "my-app"
environment: "production"
auth:
  source:
    type: static
    token: "secret-token"
  scope: "tools.invoke"
backends:
  file: "./backends.json"
cache:
  enabled: true
  path: "/tmp/toolbridge-cache.json"
  ttl_hours: 12
identity_header:
  name: "X-App-Id"
  value: "my-app"
call_ready_timeout_secs: 45
request_timeout_secs: 20
logging:
  level: "debug"
  format: "json"
"#,
    );

    assert_eq!(
        config.auth.as_ref().unwrap().source,
        TokenSourceConfig::Static {
            token: "secret-token".to_string()
        }
    );
    assert_eq!(config.auth.as_ref().unwrap().scope.as_deref(), Some("tools.invoke"));
    assert_eq!(config.backends.file.as_deref(), Some("./backends.json"));
    assert_eq!(config.cache.ttl_hours, 12);
    assert_eq!(config.call_ready_timeout_secs, 45);
    assert_eq!(config.endpoint_base(), "https://api.example.com");
    config.validate().expect("full config should validate");
}

#[test]
fn test_env_token_source_parses() {
    let config = parse(
        r#"
endpoint: "https://api.example.com"
auth:
  source:
    type: env
    var: "MY_TOKEN"
backends:
  gateway: true
app_id: "my-app"
"#,
    );

    assert_eq!(
        config.auth.as_ref().unwrap().source,
        TokenSourceConfig::Env {
            var: "MY_TOKEN".to_string()
        }
    );
}

#[test]
fn test_missing_endpoint_fails_validation() {
    let config = parse(
        r#"
backends:
  gateway: true
app_id: "my-app"
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_endpoint_url_fails_validation() {
    let config = parse(
        r#"
endpoint: "not a url"
backends:
  gateway: true
app_id: "my-app"
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_missing_backend_source_fails_validation() {
    let config = parse(r#"endpoint: "https://api.example.com""#);
    assert!(config.validate().is_err());
}

#[test]
fn test_gateway_without_app_id_fails_validation() {
    let config = parse(
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_ttl_fails_validation() {
    let config = parse(
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
app_id: "my-app"
cache:
  ttl_hours: 0
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_log_level_fails_validation() {
    let config = parse(
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
app_id: "my-app"
logging:
  level: "verbose"
  format: "text"
"#,
    );
    assert!(config.validate().is_err());
}

#[test]
fn test_environment_overrides_apply() {
    // All TOOLBRIDGE_* variables are handled in this one test to avoid
    // races between parallel tests sharing process environment
    std::env::set_var("TOOLBRIDGE_ENDPOINT", "https://override.example.com");
    std::env::set_var("TOOLBRIDGE_APP_ID", "override-app");
    std::env::set_var("TOOLBRIDGE_TOKEN", "override-token");
    std::env::set_var("TOOLBRIDGE_BACKENDS_FILE", "/etc/toolbridge/backends.json");
    std::env::set_var("TOOLBRIDGE_CACHE_PATH", "/var/cache/toolbridge.json");

    let mut config = parse(
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
app_id: "my-app"
"#,
    );
    config.apply_environment_overrides().unwrap();

    std::env::remove_var("TOOLBRIDGE_ENDPOINT");
    std::env::remove_var("TOOLBRIDGE_APP_ID");
    std::env::remove_var("TOOLBRIDGE_TOKEN");
    std::env::remove_var("TOOLBRIDGE_BACKENDS_FILE");
    std::env::remove_var("TOOLBRIDGE_CACHE_PATH");

    assert_eq!(config.endpoint, "https://override.example.com");
    assert_eq!(config.app_id.as_deref(), Some("override-app"));
    assert_eq!(
        config.auth.as_ref().unwrap().source,
        TokenSourceConfig::Static {
            token: "override-token".to_string()
        }
    );
    assert_eq!(
        config.backends.file.as_deref(),
        Some("/etc/toolbridge/backends.json")
    );
    assert_eq!(
        config.cache.path.as_deref(),
        Some("/var/cache/toolbridge.json")
    );
}

#[test]
fn test_explicit_missing_config_path_errors() {
    let result = Config::load(Some(std::path::Path::new("/nonexistent/toolbridge.yaml")), None);
    assert!(result.is_err());
}

#[test]
fn test_log_level_override_lands_in_logging_section() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("toolbridge.yaml");
    std::fs::write(
        &path,
        r#"
endpoint: "https://api.example.com"
backends:
  gateway: true
app_id: "my-app"
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), Some("debug".to_string())).unwrap();
    assert_eq!(config.logging.as_ref().unwrap().level, "debug");
}
