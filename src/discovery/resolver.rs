//! Backend resolution
//!
//! Turns a static declaration file or a gateway query into the list of
//! backend descriptors the discovery pass will walk. A gateway failure
//! surfaces immediately with the HTTP status; there is no retry here.

use crate::auth::TokenProvider;
use crate::config::Config;
use crate::error::{BridgeError, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// One backend the bridge will discover tools from
#[derive(Debug, Clone, PartialEq)]
pub struct BackendDescriptor {
    /// Routing name, unique among descriptors
    pub name: String,
    /// MCP endpoint of the backend
    pub url: String,
    /// Scope requested with tokens for this backend
    pub scope: Option<String>,
}

/// One entry of the declaration file or the gateway response
///
/// Unknown fields, including the `audience` hint some gateways attach,
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDeclaration {
    /// Display name of the server
    pub mcp_server_name: String,
    /// Disambiguated name, preferred over the display name when present
    #[serde(default)]
    pub mcp_server_unique_name: Option<String>,
    /// Explicit endpoint override
    #[serde(default)]
    pub url: Option<String>,
    /// Per-backend token scope override
    #[serde(default)]
    pub scope: Option<String>,
}

/// Gateway discovery response envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayResponse {
    #[serde(default)]
    mcp_servers: Vec<BackendDeclaration>,
}

/// Resolve the backend set from configuration
///
/// A static declaration file takes precedence over gateway discovery. An
/// empty declaration list is a valid result, not an error.
pub async fn resolve_backends(
    config: &Config,
    token_provider: Arc<dyn TokenProvider>,
) -> Result<Vec<BackendDescriptor>> {
    if let Some(file) = &config.backends.file {
        resolve_from_file(config, Path::new(file)).await
    } else if config.backends.gateway {
        resolve_from_gateway(config, token_provider).await
    } else {
        // Config validation rejects this earlier; kept for direct callers
        Err(BridgeError::config(
            "No backend source configured: set backends.file or backends.gateway",
        ))
    }
}

async fn resolve_from_file(config: &Config, path: &Path) -> Result<Vec<BackendDescriptor>> {
    debug!("Resolving backends from declaration file {}", path.display());

    let content = fs::read_to_string(path).await.map_err(|e| {
        BridgeError::config(format!(
            "Failed to read backend declaration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let entries: Vec<BackendDeclaration> = serde_json::from_str(&content).map_err(|e| {
        BridgeError::config(format!(
            "Invalid backend declaration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let descriptors = into_descriptors(config, entries);
    info!(
        "Resolved {} backends from {}",
        descriptors.len(),
        path.display()
    );
    Ok(descriptors)
}

async fn resolve_from_gateway(
    config: &Config,
    token_provider: Arc<dyn TokenProvider>,
) -> Result<Vec<BackendDescriptor>> {
    let app_id = config.app_id.as_deref().unwrap_or_default();
    let url = format!("{}/agents/{}/mcpServers", config.endpoint_base(), app_id);
    debug!("Querying gateway for backends: {}", url);

    let scope = config.auth.as_ref().and_then(|a| a.scope.as_deref());
    let token = token_provider.get_token(scope).await?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| BridgeError::connection(format!("Failed to create HTTP client: {}", e)))?;

    let mut request = client.get(&url).header("Accept", "application/json");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    // Single attempt: a failed gateway query fails resolution outright
    let response = request.send().await.map_err(|e| {
        BridgeError::discovery("gateway", format!("Gateway query failed: {}", e))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BridgeError::discovery(
            "gateway",
            format!("Gateway query returned HTTP {}: {}", status, body),
        ));
    }

    let gateway: GatewayResponse = response.json().await.map_err(|e| {
        BridgeError::discovery("gateway", format!("Invalid gateway response: {}", e))
    })?;

    let descriptors = into_descriptors(config, gateway.mcp_servers);
    info!("Resolved {} backends from gateway", descriptors.len());
    Ok(descriptors)
}

/// Build descriptors, applying name preference, URL defaulting and the
/// config-level scope fallback
fn into_descriptors(config: &Config, entries: Vec<BackendDeclaration>) -> Vec<BackendDescriptor> {
    let default_scope = config.auth.as_ref().and_then(|a| a.scope.clone());

    entries
        .into_iter()
        .map(|entry| {
            let name = entry.mcp_server_unique_name.unwrap_or(entry.mcp_server_name);
            let url = entry
                .url
                .unwrap_or_else(|| format!("{}/agents/servers/{}/", config.endpoint_base(), name));
            BackendDescriptor {
                name,
                url,
                scope: entry.scope.or_else(|| default_scope.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, TokenSourceConfig};

    fn config_with_endpoint() -> Config {
        Config {
            endpoint: "https://api.example.com".to_string(),
            ..Default::default()
        }
    }

    fn declaration(json: serde_json::Value) -> BackendDeclaration {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_unique_name_preferred_over_display_name() {
        let config = config_with_endpoint();
        let entries = vec![declaration(serde_json::json!({
            "mcpServerName": "GitHub Tools",
            "mcpServerUniqueName": "github"
        }))];

        let descriptors = into_descriptors(&config, entries);
        assert_eq!(descriptors[0].name, "github");
    }

    #[test]
    fn test_display_name_used_when_no_unique_name() {
        let config = config_with_endpoint();
        let entries = vec![declaration(serde_json::json!({
            "mcpServerName": "github"
        }))];

        let descriptors = into_descriptors(&config, entries);
        assert_eq!(descriptors[0].name, "github");
    }

    #[test]
    fn test_default_url_derived_from_endpoint() {
        let config = Config {
            endpoint: "https://api.example.com/".to_string(),
            ..Default::default()
        };
        let entries = vec![declaration(serde_json::json!({
            "mcpServerName": "github"
        }))];

        let descriptors = into_descriptors(&config, entries);
        assert_eq!(
            descriptors[0].url,
            "https://api.example.com/agents/servers/github/"
        );
    }

    #[test]
    fn test_explicit_url_override_wins() {
        let config = config_with_endpoint();
        let entries = vec![declaration(serde_json::json!({
            "mcpServerName": "github",
            "url": "https://tools.internal.example.com/mcp/"
        }))];

        let descriptors = into_descriptors(&config, entries);
        assert_eq!(descriptors[0].url, "https://tools.internal.example.com/mcp/");
    }

    #[test]
    fn test_entry_scope_wins_over_config_scope() {
        let mut config = config_with_endpoint();
        config.auth = Some(AuthConfig {
            source: TokenSourceConfig::None,
            scope: Some("tools.default".to_string()),
        });

        let entries = vec![
            declaration(serde_json::json!({
                "mcpServerName": "github",
                "scope": "tools.github"
            })),
            declaration(serde_json::json!({
                "mcpServerName": "database"
            })),
        ];

        let descriptors = into_descriptors(&config, entries);
        assert_eq!(descriptors[0].scope.as_deref(), Some("tools.github"));
        assert_eq!(descriptors[1].scope.as_deref(), Some("tools.default"));
    }

    #[test]
    fn test_audience_field_is_ignored() {
        let entry = declaration(serde_json::json!({
            "mcpServerName": "github",
            "audience": "api://tools"
        }));
        assert_eq!(entry.mcp_server_name, "github");
    }

    #[test]
    fn test_gateway_response_envelope_parses() {
        let response: GatewayResponse = serde_json::from_str(
            r#"{"mcpServers": [{"mcpServerName": "github"}, {"mcpServerName": "jira"}]}"#,
        )
        .unwrap();
        assert_eq!(response.mcp_servers.len(), 2);
    }

    #[test]
    fn test_gateway_response_without_servers_is_empty() {
        let response: GatewayResponse = serde_json::from_str("{}").unwrap();
        assert!(response.mcp_servers.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_from_missing_file_errors() {
        let mut config = config_with_endpoint();
        config.backends.file = Some("/nonexistent/backends.json".to_string());

        let result = resolve_backends(&config, Arc::new(crate::auth::NoAuthTokenProvider)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_resolve_from_file_with_empty_list_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backends.json");
        std::fs::write(&path, "[]").unwrap();

        let mut config = config_with_endpoint();
        config.backends.file = Some(path.to_string_lossy().to_string());

        let descriptors = resolve_backends(&config, Arc::new(crate::auth::NoAuthTokenProvider))
            .await
            .unwrap();
        assert!(descriptors.is_empty());
    }
}
