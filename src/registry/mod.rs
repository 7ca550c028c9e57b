//! Tool registry
//!
//! Holds the merged view of every tool discovered across backends. The
//! builder deduplicates names, the sanitizer normalizes schemas for strict
//! clients, and the cache persists one discovery batch to disk.

pub mod builder;
pub mod cache;
pub mod sanitize;
pub mod types;

pub use builder::build_snapshot;
pub use cache::{CachedToolRecord, ToolCache};
pub use sanitize::sanitize_schema;
pub use types::{DiscoveredTool, RegistryEntry, RegistrySnapshot};
