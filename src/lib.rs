//! Tool Bridge - stdio MCP facade over remote authenticated tool servers
//!
//! This crate exposes a single local MCP server to a coding assistant and
//! forwards tool invocations to a set of remote HTTP tool backends that are
//! discovered at runtime. Discovery is slow against real backends, so the
//! bridge serves immediately from a disk cache or a placeholder and swaps in
//! the live registry when it is ready.

pub mod auth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod mcp;
pub mod registry;

pub use config::Config;
pub use error::{BridgeError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "toolbridge.yaml";
