//! Error types and handling for the tool bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the tool bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Registry errors
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// MCP protocol errors
    #[error("MCP protocol error: {message}")]
    Mcp { message: String },

    /// Routing errors
    #[error("Routing error: {message}")]
    Routing { message: String },

    /// Tool execution errors
    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    /// Authentication errors
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Backend discovery errors, scoped to one backend
    #[error("Discovery error for backend '{backend}': {message}")]
    Discovery { backend: String, message: String },

    /// Connection errors (for backend MCP connections)
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BridgeError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// Create an MCP protocol error
    pub fn mcp<S: Into<String>>(message: S) -> Self {
        Self::Mcp {
            message: message.into(),
        }
    }

    /// Create a routing error
    pub fn routing<S: Into<String>>(message: S) -> Self {
        Self::Routing {
            message: message.into(),
        }
    }

    /// Create a tool execution error
    pub fn tool_execution<T: Into<String>, S: Into<String>>(tool_name: T, message: S) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a discovery error scoped to one backend
    pub fn discovery<B: Into<String>, S: Into<String>>(backend: B, message: S) -> Self {
        Self::Discovery {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error (using connection error type)
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: format!("Timeout: {}", message.into()),
        }
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Http(_) | BridgeError::Io(_) | BridgeError::ToolExecution { .. }
        )
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            BridgeError::Config { .. } => "config",
            BridgeError::Registry { .. } => "registry",
            BridgeError::Mcp { .. } => "mcp",
            BridgeError::Routing { .. } => "routing",
            BridgeError::ToolExecution { .. } => "tool_execution",
            BridgeError::Auth { .. } => "auth",
            BridgeError::Discovery { .. } => "discovery",
            BridgeError::Connection { .. } => "connection",
            BridgeError::Io(_) => "io",
            BridgeError::Serde(_) => "serialization",
            BridgeError::Yaml(_) => "yaml",
            BridgeError::Http(_) => "http",
            BridgeError::Internal(_) => "internal",
        }
    }
}

impl Clone for BridgeError {
    fn clone(&self) -> Self {
        match self {
            BridgeError::Config { message } => BridgeError::Config { message: message.clone() },
            BridgeError::Registry { message } => BridgeError::Registry { message: message.clone() },
            BridgeError::Mcp { message } => BridgeError::Mcp { message: message.clone() },
            BridgeError::Routing { message } => BridgeError::Routing { message: message.clone() },
            BridgeError::ToolExecution { tool_name, message } => BridgeError::ToolExecution {
                tool_name: tool_name.clone(),
                message: message.clone()
            },
            BridgeError::Auth { message } => BridgeError::Auth { message: message.clone() },
            BridgeError::Discovery { backend, message } => BridgeError::Discovery {
                backend: backend.clone(),
                message: message.clone()
            },
            BridgeError::Connection { message } => BridgeError::Connection { message: message.clone() },

            // For non-cloneable types, convert to string representation
            BridgeError::Io(e) => BridgeError::connection(format!("IO error: {}", e)),
            BridgeError::Serde(e) => BridgeError::mcp(format!("Serialization error: {}", e)),
            BridgeError::Yaml(e) => BridgeError::config(format!("YAML error: {}", e)),
            BridgeError::Http(e) => BridgeError::connection(format!("HTTP error: {}", e)),
            BridgeError::Internal(e) => BridgeError::mcp(format!("Internal error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_helpers() {
        let err = BridgeError::config("bad endpoint");
        assert!(matches!(err, BridgeError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: bad endpoint");

        let err = BridgeError::discovery("github", "connection refused");
        assert_eq!(err.category(), "discovery");
        assert!(err.to_string().contains("github"));
    }

    #[test]
    fn test_timeout_maps_to_connection() {
        let err = BridgeError::timeout("backend did not answer");
        assert!(matches!(err, BridgeError::Connection { .. }));
        assert!(err.to_string().contains("Timeout"));
    }

    #[test]
    fn test_clone_preserves_message_variants() {
        let err = BridgeError::tool_execution("search", "backend returned 500");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BridgeError::tool_execution("t", "m").is_retryable());
        assert!(!BridgeError::config("m").is_retryable());
        assert!(!BridgeError::auth("m").is_retryable());
    }
}
