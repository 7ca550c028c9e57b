//! Authentication module for the tool bridge
//!
//! Exposes the token-acquisition boundary the rest of the bridge consumes.

mod token;

pub use token::{
    provider_from_config, EnvTokenProvider, NoAuthTokenProvider, StaticTokenProvider,
    TokenProvider,
};
