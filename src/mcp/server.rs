//! MCP server dispatcher
//!
//! Owns the serve-immediately lifecycle: the server answers tools/list from
//! the best snapshot already available (live registry, then disk cache, then
//! a single placeholder entry) while the discovery pass runs in the
//! background. tools/call is the only operation allowed to wait: a call made
//! before discovery completes blocks up to a ceiling and then degrades to a
//! structured "still connecting" result.
//!
//! Routing problems (unknown tool, missing backend, forwarding failure) are
//! rendered as structured error content, never as transport-level errors.

use crate::auth::{provider_from_config, TokenProvider};
use crate::config::Config;
use crate::discovery::{resolve_backends, BackendDescriptor, DiscoveryEngine, DiscoveryState};
use crate::error::Result;
use crate::mcp::clients::{HttpClientConfig, HttpMcpClient, IdentityHeader};
use crate::mcp::errors::McpErrorCode;
use crate::mcp::notifications::McpNotificationManager;
use crate::mcp::types::{McpRequest, Tool, ToolCall, ToolResult};
use crate::registry::{build_snapshot, DiscoveredTool, RegistryEntry, RegistrySnapshot, ToolCache};
use arc_swap::{ArcSwap, ArcSwapOption};
use dashmap::DashMap;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Placeholder listed while no snapshot exists yet
pub const PLACEHOLDER_SETUP: &str = "toolbridge_setup";
/// Placeholder listed when discovery failed outright
pub const PLACEHOLDER_STATUS: &str = "toolbridge_status";

/// MCP server for the tool bridge
pub struct BridgeMcpServer {
    /// Loaded configuration
    config: Config,
    /// Token provider shared with discovery and forwarding
    token_provider: Arc<dyn TokenProvider>,
    /// Optional tenant/app identity header for backend requests
    identity_header: Option<IdentityHeader>,
    /// Discovery engine; owns the discovery state machine
    engine: Arc<DiscoveryEngine>,
    /// Current registry snapshot: live once discovery completes, disk-derived
    /// before that, absent until either exists
    snapshot: ArcSwapOption<RegistrySnapshot>,
    /// Resolved backend descriptors by name, populated by the discovery task
    backends: ArcSwap<HashMap<String, BackendDescriptor>>,
    /// Disk cache, if enabled
    cache: Option<ToolCache>,
    /// Outbound notification fan-out
    notification_manager: Arc<McpNotificationManager>,
    /// One cached connection slot per backend, replaced on every call
    connections: DashMap<String, Arc<HttpMcpClient>>,
}

impl BridgeMcpServer {
    /// Create a server without loading the disk cache or starting discovery
    pub fn new(config: Config) -> Self {
        let token_provider = provider_from_config(config.auth.as_ref());
        let identity_header = config.identity_header.as_ref().map(IdentityHeader::from);
        let engine = Arc::new(DiscoveryEngine::new(
            token_provider.clone(),
            config.request_timeout_secs,
            identity_header.clone(),
        ));
        let cache = if config.cache.enabled {
            Some(ToolCache::new(
                config.cache.resolved_path(),
                config.cache.ttl_hours,
            ))
        } else {
            None
        };

        Self {
            token_provider,
            identity_header,
            engine,
            snapshot: ArcSwapOption::empty(),
            backends: ArcSwap::from_pointee(HashMap::new()),
            cache,
            notification_manager: Arc::new(McpNotificationManager::new()),
            connections: DashMap::new(),
            config,
        }
    }

    /// Create a fully wired server: load the disk cache, then launch the
    /// background discovery pass
    pub async fn with_config(config: &Config) -> Arc<Self> {
        let server = Arc::new(Self::new(config.clone()));
        server.load_disk_snapshot().await;
        server.spawn_discovery();
        server
    }

    /// Discovery engine handle
    pub fn engine(&self) -> &Arc<DiscoveryEngine> {
        &self.engine
    }

    /// Notification manager handle
    pub fn notification_manager(&self) -> &Arc<McpNotificationManager> {
        &self.notification_manager
    }

    /// Seed the registry from the disk cache if a fresh batch exists
    pub async fn load_disk_snapshot(&self) {
        if let Some(cache) = &self.cache {
            if let Some(tools) = cache.load().await {
                let snapshot = build_snapshot(tools);
                info!(
                    "Serving {} cached tools until live discovery completes",
                    snapshot.len()
                );
                self.snapshot.store(Some(Arc::new(snapshot)));
            }
        }
    }

    /// Launch the background discovery pass; called exactly once
    pub fn spawn_discovery(self: &Arc<Self>) {
        self.engine.mark_running();
        let server = self.clone();
        tokio::spawn(async move {
            server.run_discovery().await;
        });
    }

    async fn run_discovery(self: Arc<Self>) {
        let backends = match resolve_backends(&self.config, self.token_provider.clone()).await {
            Ok(backends) => backends,
            Err(e) => {
                error!("Backend resolution failed: {}", e);
                self.engine.mark_failed(e.to_string());
                return;
            }
        };

        let results = self.engine.discover_all(&backends).await;
        let tools: Vec<DiscoveredTool> = results.into_iter().flat_map(|r| r.tools).collect();
        self.apply_live_results(backends, tools).await;
    }

    /// Install live discovery results: swap the registry, flip the state to
    /// `Complete`, persist the batch and announce the change
    pub async fn apply_live_results(
        &self,
        backends: Vec<BackendDescriptor>,
        tools: Vec<DiscoveredTool>,
    ) {
        let backend_map: HashMap<String, BackendDescriptor> = backends
            .into_iter()
            .map(|b| (b.name.clone(), b))
            .collect();
        self.backends.store(Arc::new(backend_map));

        let snapshot = build_snapshot(tools.clone());
        info!("Live registry ready with {} tools", snapshot.len());
        self.snapshot.store(Some(Arc::new(snapshot)));

        // Waiters woken here observe the live registry stored above
        self.engine.mark_complete();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&tools).await {
                warn!("Failed to persist tool cache: {}", e);
            }
        }

        if let Err(e) = self.notification_manager.notify_tools_list_changed() {
            debug!("tools/list_changed not delivered: {}", e);
        }
    }

    /// Handle list_tools request; never blocks on discovery
    pub async fn list_tools(&self) -> Vec<Tool> {
        debug!("Handling list_tools request");

        if let Some(snapshot) = self.snapshot.load_full() {
            let tools = snapshot.tools();
            info!("Returning {} tools", tools.len());
            return tools;
        }

        // No snapshot yet: exactly one placeholder entry
        match self.engine.state() {
            DiscoveryState::Failed(reason) => vec![failure_placeholder(&reason)],
            _ => vec![setup_placeholder()],
        }
    }

    /// Handle call_tool request
    ///
    /// Always returns a well-formed MCP tool result value; forwarded results
    /// come back verbatim and every local failure is structured content.
    pub async fn call_tool(&self, tool_call: ToolCall) -> Value {
        debug!("Handling call_tool request for: {}", tool_call.name);

        // Placeholders are intercepted before any registry lookup
        if tool_call.name == PLACEHOLDER_SETUP || tool_call.name == PLACEHOLDER_STATUS {
            return self.placeholder_status();
        }

        // A present snapshot answers unknown names without waiting
        if let Some(snapshot) = self.snapshot.load_full() {
            if snapshot.get(&tool_call.name).is_none() {
                return self.unknown_tool_result(&tool_call.name, &snapshot);
            }
        }

        // Calls wait for live connection capability; list never does
        match self.wait_for_ready().await {
            DiscoveryState::Complete => {}
            DiscoveryState::Failed(reason) => {
                error!(
                    "Call to '{}' rejected, discovery failed: {}",
                    tool_call.name, reason
                );
                return format_mcp_response(ToolResult::error_with_metadata(
                    format!("Tool discovery failed: {}", reason),
                    json!({
                        "tool_name": tool_call.name,
                        "error_category": "discovery_failed",
                    }),
                ));
            }
            _ => {
                warn!(
                    "Call to '{}' timed out after {}s waiting for discovery",
                    tool_call.name, self.config.call_ready_timeout_secs
                );
                return format_mcp_response(ToolResult::error_with_metadata(
                    format!(
                        "Still connecting to tool backends; tool '{}' is not callable yet. Try again shortly.",
                        tool_call.name
                    ),
                    json!({
                        "tool_name": tool_call.name,
                        "error_category": "still_connecting",
                        "waited_secs": self.config.call_ready_timeout_secs,
                    }),
                ));
            }
        }

        // The live registry is authoritative from here on
        let snapshot = match self.snapshot.load_full() {
            Some(snapshot) => snapshot,
            None => {
                return self.unknown_tool_result(&tool_call.name, &RegistrySnapshot::empty())
            }
        };
        let entry = match snapshot.get(&tool_call.name) {
            Some(entry) => entry.clone(),
            None => return self.unknown_tool_result(&tool_call.name, &snapshot),
        };

        let backends = self.backends.load_full();
        let descriptor = match backends.get(&entry.origin_backend) {
            Some(descriptor) => descriptor.clone(),
            None => {
                error!(
                    "No backend '{}' available for tool '{}'",
                    entry.origin_backend, tool_call.name
                );
                return format_mcp_response(ToolResult::error_with_metadata(
                    format!(
                        "No backend '{}' available for tool '{}'",
                        entry.origin_backend, tool_call.name
                    ),
                    json!({
                        "tool_name": tool_call.name,
                        "error_category": "backend_missing",
                    }),
                ));
            }
        };

        self.forward_call(&descriptor, &entry, tool_call.arguments)
            .await
    }

    /// Block until discovery reaches a terminal state or the ceiling elapses
    async fn wait_for_ready(&self) -> DiscoveryState {
        let state = self.engine.state();
        if state.is_terminal() {
            return state;
        }

        let mut rx = self.engine.subscribe();
        let ceiling = Duration::from_secs(self.config.call_ready_timeout_secs);
        let state = match tokio::time::timeout(ceiling, rx.wait_for(|s| s.is_terminal())).await {
            Ok(Ok(state)) => state.clone(),
            // Sender dropped or ceiling elapsed: report whatever we have
            Ok(Err(_)) | Err(_) => self.engine.state(),
        };
        state
    }

    /// Forward one call to its origin backend; never raises
    ///
    /// Any cached connection for that backend is discarded first, because
    /// backends reject stale connections and stale tokens.
    async fn forward_call(
        &self,
        descriptor: &BackendDescriptor,
        entry: &RegistryEntry,
        arguments: Value,
    ) -> Value {
        self.connections.remove(&descriptor.name);

        let client = match HttpMcpClient::new(
            HttpClientConfig {
                base_url: descriptor.url.clone(),
                timeout: self.config.request_timeout_secs,
                scope: descriptor.scope.clone(),
                identity_header: self.identity_header.clone(),
            },
            descriptor.name.clone(),
            self.token_provider.clone(),
        ) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(
                    "Failed to open connection to backend '{}': {}",
                    descriptor.name, e
                );
                return format_mcp_response(ToolResult::error_with_metadata(
                    format!("Failed to connect to backend '{}': {}", descriptor.name, e),
                    json!({
                        "tool_name": entry.external_name,
                        "backend": descriptor.name,
                        "error_category": "connection_failure",
                    }),
                ));
            }
        };
        self.connections
            .insert(descriptor.name.clone(), client.clone());

        debug!(
            "Forwarding '{}' as '{}' to backend '{}'",
            entry.external_name, entry.original_name, descriptor.name
        );
        match client.call_tool(&entry.original_name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    "Tool '{}' failed on backend '{}': {}",
                    entry.external_name, descriptor.name, e
                );
                format_mcp_response(ToolResult::error_with_metadata(
                    format!("Tool '{}' failed: {}", entry.external_name, e),
                    json!({
                        "tool_name": entry.external_name,
                        "backend": descriptor.name,
                        "error_category": e.category(),
                    }),
                ))
            }
        }
    }

    fn unknown_tool_result(&self, name: &str, snapshot: &RegistrySnapshot) -> Value {
        let known = snapshot.external_names();
        error!("Tool '{}' not found in registry", name);

        let message = if known.is_empty() {
            format!("Tool '{}' not found; no tools are currently available", name)
        } else {
            format!("Tool '{}' not found. Known tools: {}", name, known.join(", "))
        };
        format_mcp_response(ToolResult::error_with_metadata(
            message,
            json!({
                "tool_name": name,
                "error_category": "tool_not_found",
                "known_tools": known,
            }),
        ))
    }

    /// Static status answer for the placeholder tools
    fn placeholder_status(&self) -> Value {
        let text = match self.engine.state() {
            DiscoveryState::NotStarted | DiscoveryState::Running => {
                "Still connecting to tool backends. The tool list updates automatically when discovery completes.".to_string()
            }
            DiscoveryState::Complete => {
                let count = self
                    .snapshot
                    .load_full()
                    .map(|s| s.len())
                    .unwrap_or_default();
                format!("Connected. {} tools available.", count)
            }
            DiscoveryState::Failed(reason) => format!(
                "Tool discovery failed: {}. Fix the bridge configuration and restart.",
                reason
            ),
        };
        format_mcp_response(ToolResult::success_text(text))
    }

    /// Handle a single MCP JSON-RPC request, returning the serialized
    /// response, or None for notifications
    pub async fn handle_mcp_request(&self, request: McpRequest) -> Result<Option<String>> {
        debug!("Handling MCP method: {}", request.method);

        let response = match request.method.as_str() {
            "initialize" => {
                if let Some(ref id) = request.id {
                    self.create_success_response(id, self.initialize_result())
                } else {
                    self.create_error_response(
                        None,
                        McpErrorCode::InvalidRequest,
                        "Initialize request must have an ID",
                    )
                }
            }
            "initialized" | "notifications/initialized" => {
                // Handshake completion notification, no response
                return Ok(None);
            }
            "tools/list" => {
                let tools = self.list_tools().await;
                if let Some(ref id) = request.id {
                    self.create_success_response(id, json!({"tools": tools}))
                } else {
                    self.create_error_response(
                        None,
                        McpErrorCode::InvalidRequest,
                        "Request must have an ID",
                    )
                }
            }
            "tools/call" => {
                let params = request.params.unwrap_or(json!({}));
                match serde_json::from_value::<ToolCall>(params) {
                    Ok(tool_call) => {
                        let result = self.call_tool(tool_call).await;
                        if let Some(ref id) = request.id {
                            self.create_success_response(id, result)
                        } else {
                            self.create_error_response(
                                None,
                                McpErrorCode::InvalidRequest,
                                "Request must have an ID",
                            )
                        }
                    }
                    Err(e) => self.create_error_response(
                        request.id.as_ref(),
                        McpErrorCode::InvalidParams,
                        &format!("Invalid tool call parameters: {}", e),
                    ),
                }
            }
            _ => {
                if request.id.is_none() {
                    debug!("Ignoring unknown notification '{}'", request.method);
                    return Ok(None);
                }
                self.create_error_response(
                    request.id.as_ref(),
                    McpErrorCode::MethodNotFound,
                    &format!("Method '{}' not found", request.method),
                )
            }
        };

        Ok(Some(response))
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": self.config.client.protocol_version,
            "capabilities": {
                "tools": { "listChanged": true }
            },
            "serverInfo": {
                "name": self.config.client.client_name,
                "version": self.config.client.client_version,
            }
        })
    }

    /// Create a success JSON-RPC response
    fn create_success_response(&self, id: &Value, result: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        })
        .to_string()
    }

    /// Create an error JSON-RPC response
    fn create_error_response(&self, id: Option<&Value>, code: McpErrorCode, message: &str) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": code as i32,
                "message": message
            }
        })
        .to_string()
    }

    /// Close cached backend connections; in-flight work is abandoned
    pub fn shutdown(&self) {
        let held = self.connections.len();
        self.connections.clear();
        if held > 0 {
            info!("Closed {} cached backend connections", held);
        }
        info!("Bridge server shut down");
    }
}

/// Format a ToolResult as an MCP tool result value
fn format_mcp_response(result: ToolResult) -> Value {
    let mut value = json!({
        "content": result.content,
        "isError": result.is_error,
    });
    if let Some(metadata) = result.metadata {
        value["_meta"] = metadata;
    }
    value
}

fn setup_placeholder() -> Tool {
    Tool {
        name: PLACEHOLDER_SETUP.to_string(),
        description: Some(
            "Remote tools are still being discovered. Call this tool to check \
             connection status; the real tool list appears automatically once \
             discovery completes."
                .to_string(),
        ),
        input_schema: json!({"type": "object", "properties": {}}),
    }
}

fn failure_placeholder(reason: &str) -> Tool {
    Tool {
        name: PLACEHOLDER_STATUS.to_string(),
        description: Some(format!(
            "Tool discovery failed: {}. Fix the bridge configuration (endpoint, \
             credentials, backend declarations) and restart. Call this tool for \
             current status.",
            reason
        )),
        input_schema: json!({"type": "object", "properties": {}}),
    }
}
