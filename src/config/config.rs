//! Configuration management for the tool bridge

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Default functions for serde
fn default_protocol_version() -> String {
    "2025-06-18".to_string()
}

fn default_client_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_request_timeout() -> u64 { 30 }
fn default_call_ready_timeout() -> u64 { 30 }
fn default_cache_enabled() -> bool { true }
fn default_cache_ttl_hours() -> u64 { 24 }

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the tool service (gateway queries and default backend URLs
    /// are derived from it)
    #[serde(default)]
    pub endpoint: String,
    /// Application id, required for gateway backend discovery and used for the
    /// optional identity header
    pub app_id: Option<String>,
    /// Deployment environment name (selects .env.{environment})
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Token acquisition configuration
    pub auth: Option<AuthConfig>,
    /// Where the list of backends comes from
    #[serde(default)]
    pub backends: BackendsConfig,
    /// Disk cache for discovered tools
    #[serde(default)]
    pub cache: CacheConfig,
    /// Optional tenant/app identity header sent on every backend request
    pub identity_header: Option<IdentityHeaderConfig>,
    /// How long a tools/call may wait for discovery to complete, in seconds
    #[serde(default = "default_call_ready_timeout")]
    pub call_ready_timeout_secs: u64,
    /// Per-request timeout for backend HTTP calls, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Logging configuration
    pub logging: Option<LoggingConfig>,
    /// MCP client identification
    #[serde(default)]
    pub client: McpClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            app_id: None,
            environment: default_environment(),
            auth: None,
            backends: BackendsConfig::default(),
            cache: CacheConfig::default(),
            identity_header: None,
            call_ready_timeout_secs: default_call_ready_timeout(),
            request_timeout_secs: default_request_timeout(),
            logging: None,
            client: McpClientConfig::default(),
        }
    }
}

/// Token acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where bearer tokens come from
    #[serde(default)]
    pub source: TokenSourceConfig,
    /// Default scope requested with each token
    pub scope: Option<String>,
}

/// Token source for backend authentication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type")]
pub enum TokenSourceConfig {
    /// No authentication (mock/local backends)
    #[serde(rename = "none")]
    #[default]
    None,
    /// Fixed token from the config file
    #[serde(rename = "static")]
    Static { token: String },
    /// Token read from an environment variable at call time
    #[serde(rename = "env")]
    Env { var: String },
}

/// Backend list source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendsConfig {
    /// Path to a static declaration file (JSON list of backend entries)
    pub file: Option<String>,
    /// Query the gateway discovery endpoint instead of a static file
    #[serde(default)]
    pub gateway: bool,
}

/// Disk cache configuration for discovered tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable the disk cache
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache file path; defaults to ~/.toolbridge/tools-cache.json
    pub path: Option<String>,
    /// Staleness cutoff in hours
    #[serde(default = "default_cache_ttl_hours")]
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl_hours: 24,
        }
    }
}

impl CacheConfig {
    /// Resolve the cache file path, falling back to the home directory default
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(path),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".toolbridge")
                .join("tools-cache.json"),
        }
    }
}

/// Identity header attached to every backend request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityHeaderConfig {
    /// Header name, e.g. "X-App-Id"
    pub name: String,
    /// Header value
    pub value: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, text, pretty)
    pub format: String,
    /// Optional log file path
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            file: None,
        }
    }
}

/// MCP client identification sent during the backend handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpClientConfig {
    /// Protocol version advertised to backends and the host
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Client name
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Client version
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

impl Default for McpClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Result<()> {
        match self.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(BridgeError::config(format!(
                "Invalid log level: '{}'. Valid levels: trace, debug, info, warn, error",
                self.level
            )))
        }

        match self.format.to_lowercase().as_str() {
            "json" | "text" | "pretty" => {}
            _ => return Err(BridgeError::config(format!(
                "Invalid log format: '{}'. Valid formats: json, text, pretty",
                self.format
            )))
        }

        Ok(())
    }
}

impl Config {
    /// Load .env files in order of precedence
    fn load_env_files() -> Result<()> {
        let env = std::env::var("TOOLBRIDGE_ENV")
            .or_else(|_| std::env::var("ENV"))
            .unwrap_or_else(|_| "development".to_string());

        // Each file overrides the previous one
        let env_specific_file = format!(".env.{}", env);
        let env_files = vec![
            ".env",
            &env_specific_file,
            ".env.local",
        ];

        for env_file in env_files {
            match dotenvy::from_filename(env_file) {
                Ok(_) => {
                    tracing::info!("Loaded environment variables from {}", env_file);
                }
                Err(e) if e.to_string().contains("not found") => {
                    tracing::debug!("No {} file found, skipping", env_file);
                }
                Err(e) => {
                    tracing::warn!("Failed to load {}: {}", env_file, e);
                }
            }
        }

        Ok(())
    }

    /// Candidate config file locations, in search order
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(crate::DEFAULT_CONFIG_FILE)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".toolbridge").join(crate::DEFAULT_CONFIG_FILE));
        }
        paths
    }

    /// Load configuration from file with environment variable and CLI overrides
    pub fn load(
        path: Option<&Path>,
        log_level_override: Option<String>,
    ) -> Result<Self> {
        // Precedence: .env files < config file < environment < CLI
        Self::load_env_files()?;

        let resolved = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(BridgeError::config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                Some(p.to_path_buf())
            }
            None => Self::search_paths().into_iter().find(|p| p.exists()),
        };

        let mut config = match resolved {
            Some(p) => {
                let content = std::fs::read_to_string(&p).map_err(|e| {
                    BridgeError::config(format!("Failed to read config file: {}", e))
                })?;
                tracing::info!("Loading configuration from {}", p.display());
                serde_yaml::from_str(&content).map_err(|e| {
                    BridgeError::config(format!("Failed to parse config file: {}", e))
                })?
            }
            None => {
                tracing::warn!("Config file not found, using defaults");
                Self::default()
            }
        };

        config.apply_environment_overrides()?;

        if let Some(level) = log_level_override {
            let logging = config.logging.get_or_insert_with(LoggingConfig::default);
            logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Ok(endpoint) = std::env::var("TOOLBRIDGE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }

        if let Ok(app_id) = std::env::var("TOOLBRIDGE_APP_ID") {
            if !app_id.is_empty() {
                self.app_id = Some(app_id);
            }
        }

        if let Ok(token) = std::env::var("TOOLBRIDGE_TOKEN") {
            if !token.is_empty() {
                let auth = self.auth.get_or_insert_with(|| AuthConfig {
                    source: TokenSourceConfig::None,
                    scope: None,
                });
                auth.source = TokenSourceConfig::Static { token };
            }
        }

        if let Ok(file) = std::env::var("TOOLBRIDGE_BACKENDS_FILE") {
            if !file.is_empty() {
                self.backends.file = Some(file);
            }
        }

        if let Ok(path) = std::env::var("TOOLBRIDGE_CACHE_PATH") {
            if !path.is_empty() {
                self.cache.path = Some(path);
            }
        }

        Ok(())
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(BridgeError::config(
                "Endpoint URL is required (set 'endpoint' in the config file or TOOLBRIDGE_ENDPOINT)"
            ));
        }

        url::Url::parse(&self.endpoint).map_err(|e| {
            BridgeError::config(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;

        if self.backends.file.is_none() && !self.backends.gateway {
            return Err(BridgeError::config(
                "No backend source configured: set backends.file or backends.gateway"
            ));
        }

        if self.backends.gateway && self.app_id.is_none() {
            return Err(BridgeError::config(
                "Gateway backend discovery requires app_id"
            ));
        }

        if self.cache.ttl_hours == 0 {
            return Err(BridgeError::config("cache.ttl_hours must be greater than zero"));
        }

        if self.call_ready_timeout_secs == 0 {
            return Err(BridgeError::config(
                "call_ready_timeout_secs must be greater than zero"
            ));
        }

        if let Some(header) = &self.identity_header {
            if header.name.is_empty() {
                return Err(BridgeError::config("identity_header.name cannot be empty"));
            }
        }

        if let Some(logging) = &self.logging {
            logging.validate()?;
        }

        Ok(())
    }

    /// Base endpoint with any trailing slash removed
    pub fn endpoint_base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}
