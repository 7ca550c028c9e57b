//! HTTP MCP client
//!
//! Client for one backend tool server speaking MCP-over-HTTP. Every request
//! fetches a fresh bearer token from the token provider, because backends
//! reject stale tokens. No automatic retries: a tools/call is not assumed
//! idempotent, so failures surface to the caller instead of re-invoking.

use crate::auth::TokenProvider;
use crate::error::{BridgeError, Result};
use crate::mcp::types::{McpRequest, McpResponse, Tool};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Fixed user-agent sent with every backend request
const USER_AGENT: &str = concat!("toolbridge-http-client/", env!("CARGO_PKG_VERSION"));

/// Identity header attached to every backend request
#[derive(Debug, Clone)]
pub struct IdentityHeader {
    /// Header name
    pub name: String,
    /// Header value
    pub value: String,
}

impl From<&crate::config::IdentityHeaderConfig> for IdentityHeader {
    fn from(config: &crate::config::IdentityHeaderConfig) -> Self {
        Self {
            name: config.name.clone(),
            value: config.value.clone(),
        }
    }
}

/// HTTP MCP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for the backend service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Scope requested with each token
    pub scope: Option<String>,
    /// Optional tenant/app identity header
    pub identity_header: Option<IdentityHeader>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: 30,
            scope: None,
            identity_header: None,
        }
    }
}

/// HTTP MCP client for one backend tool server
#[derive(Clone)]
pub struct HttpMcpClient {
    /// Client configuration
    config: HttpClientConfig,
    /// Underlying HTTP client
    http_client: Client,
    /// Base URL parsed
    base_url: Url,
    /// Token provider consulted before every request
    token_provider: Arc<dyn TokenProvider>,
    /// Backend identifier (for logs and errors)
    service_id: String,
}

impl HttpMcpClient {
    /// Create a new HTTP MCP client
    pub fn new(
        config: HttpClientConfig,
        service_id: String,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| BridgeError::connection(format!(
                "Invalid base URL '{}': {}", config.base_url, e
            )))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BridgeError::connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
            token_provider,
            service_id,
        })
    }

    /// Get tools from the backend
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        let request = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(Uuid::new_v4().to_string())),
            method: "tools/list".to_string(),
            params: None,
        };

        let response = self.send_request(&request).await?;

        if let Some(result) = response.result {
            let tools_value = result.get("tools")
                .ok_or_else(|| BridgeError::mcp("Missing 'tools' field in tools/list response"))?;

            let tools: Vec<Tool> = serde_json::from_value(tools_value.clone())
                .map_err(|e| BridgeError::mcp(format!("Invalid tools format: {}", e)))?;

            info!("Retrieved {} tools from backend {}", tools.len(), self.service_id);
            Ok(tools)
        } else if let Some(error) = response.error {
            Err(BridgeError::mcp(format!("MCP error from backend: {}", error.message)))
        } else {
            Err(BridgeError::mcp("Empty response from tools/list"))
        }
    }

    /// Call a tool on the backend, returning the raw JSON-RPC result
    pub async fn call_tool(&self, tool_name: &str, arguments: Value) -> Result<Value> {
        let request = McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(Uuid::new_v4().to_string())),
            method: "tools/call".to_string(),
            params: Some(json!({
                "name": tool_name,
                "arguments": arguments
            })),
        };

        let response = self.send_request(&request).await?;

        if let Some(result) = response.result {
            Ok(result)
        } else if let Some(error) = response.error {
            Err(BridgeError::mcp(format!("MCP error from backend: {}", error.message)))
        } else {
            Err(BridgeError::mcp("Empty response from tools/call"))
        }
    }

    /// Send an MCP request to the backend
    async fn send_request(&self, request: &McpRequest) -> Result<McpResponse> {
        debug!(
            "Sending HTTP MCP request to {}: method={}, id={:?}",
            self.service_id, request.method, request.id
        );

        let mut req_builder = self.http_client
            .post(self.base_url.clone())
            .header("Content-Type", "application/json")
            .json(request);

        req_builder = self.apply_headers(req_builder).await?;

        let response = req_builder
            .send()
            .await
            .map_err(|e| BridgeError::connection(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BridgeError::connection(format!(
                "HTTP {} error from backend '{}': {}",
                status, self.service_id, error_text
            )));
        }

        let response_text = response.text().await
            .map_err(|e| BridgeError::connection(format!("Failed to read response body: {}", e)))?;

        let mcp_response: McpResponse = serde_json::from_str(&response_text)
            .map_err(|e| BridgeError::mcp(format!("Invalid MCP response JSON: {}", e)))?;

        debug!(
            "Received HTTP MCP response from {}: id={:?}, success={}",
            self.service_id, mcp_response.id, mcp_response.error.is_none()
        );

        Ok(mcp_response)
    }

    /// Attach the freshly fetched bearer token and identity header
    async fn apply_headers(&self, mut req_builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token_provider
            .get_token(self.config.scope.as_deref())
            .await
            .map_err(|e| BridgeError::auth(format!(
                "Token acquisition failed for backend '{}': {}", self.service_id, e
            )))?;

        // None means no-auth mode: the header is omitted entirely
        if let Some(token) = token {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", token));
        }

        if let Some(header) = &self.config.identity_header {
            req_builder = req_builder.header(&header.name, &header.value);
        }

        Ok(req_builder)
    }

    /// Get service ID
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Get configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
