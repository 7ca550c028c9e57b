//! MCP (Model Context Protocol) implementation
//!
//! The server side speaks JSON-RPC over stdio to the host; the client side
//! speaks the same tool operations over HTTP to the backends.

pub mod clients;
pub mod errors;
pub mod notifications;
pub mod server;
pub mod types;

pub use clients::{HttpClientConfig, HttpMcpClient, IdentityHeader};
pub use errors::{McpError, McpErrorCode};
pub use notifications::{McpNotification, McpNotificationManager, NotificationCapabilities};
pub use server::{BridgeMcpServer, PLACEHOLDER_SETUP, PLACEHOLDER_STATUS};
pub use types::{McpRequest, McpResponse, Tool, ToolCall, ToolContent, ToolResult};
