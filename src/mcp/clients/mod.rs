//! Backend MCP clients
//!
//! Client implementations for talking to remote backend tool servers. The
//! only transport backends speak today is MCP-over-HTTP.

pub mod http_client;

pub use http_client::{HttpClientConfig, HttpMcpClient, IdentityHeader};
