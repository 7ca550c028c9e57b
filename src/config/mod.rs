//! Configuration module for the tool bridge

mod config;

pub use config::{
    Config, AuthConfig, TokenSourceConfig, BackendsConfig, CacheConfig,
    IdentityHeaderConfig, LoggingConfig, McpClientConfig,
};
