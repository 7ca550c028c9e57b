//! Backend discovery
//!
//! Resolution turns configuration into backend descriptors; the engine
//! walks those descriptors and collects each backend's tool set.

pub mod engine;
pub mod resolver;

pub use engine::{BackendDiscovery, DiscoveryEngine, DiscoveryState};
pub use resolver::{resolve_backends, BackendDeclaration, BackendDescriptor};
