//! Registry data structures
//!
//! The registry is the deduplicated, externally addressable view of every
//! tool discovered across all backends. A snapshot is immutable once built;
//! the dispatcher replaces the whole snapshot atomically and readers never
//! see a half-built registry.

use crate::mcp::types::Tool;
use serde_json::Value;
use std::collections::HashMap;

/// A tool as reported by its origin backend
///
/// `name` is the backend's own name for the tool and is not unique across
/// backends.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredTool {
    /// Tool name as reported by the backend
    pub name: String,
    /// Tool description
    pub description: Option<String>,
    /// Raw input schema as reported by the backend
    pub input_schema: Value,
    /// Name of the backend that reported this tool
    pub origin_backend: String,
}

/// The registry's canonical unit: one externally visible tool
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Externally visible name, unique within a snapshot
    pub external_name: String,
    /// Name the origin backend knows this tool by
    pub original_name: String,
    /// Backend that owns the tool
    pub origin_backend: String,
    /// Tool description
    pub description: Option<String>,
    /// Input schema after composition-keyword sanitization
    pub sanitized_schema: Value,
}

impl RegistryEntry {
    /// Render this entry as an MCP tool definition
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.external_name.clone(),
            description: self.description.clone(),
            input_schema: self.sanitized_schema.clone(),
        }
    }
}

/// Immutable point-in-time registry
///
/// Entries keep discovery order; the index maps external names back into it
/// for call routing.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl RegistrySnapshot {
    /// Create an empty snapshot
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from entries whose external names are already unique
    pub(crate) fn from_entries(entries: Vec<RegistryEntry>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.external_name.clone(), i))
            .collect();
        Self { entries, index }
    }

    /// Look up an entry by its external name
    pub fn get(&self, external_name: &str) -> Option<&RegistryEntry> {
        self.index.get(external_name).map(|&i| &self.entries[i])
    }

    /// All entries in discovery order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// All external names in discovery order
    pub fn external_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.external_name.as_str()).collect()
    }

    /// Render every entry as an MCP tool definition
    pub fn tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|e| e.to_tool()).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(external: &str, original: &str, backend: &str) -> RegistryEntry {
        RegistryEntry {
            external_name: external.to_string(),
            original_name: original.to_string(),
            origin_backend: backend.to_string(),
            description: Some(format!("{} from {}", original, backend)),
            sanitized_schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn test_snapshot_lookup_and_order() {
        let snapshot = RegistrySnapshot::from_entries(vec![
            entry("search", "search", "github"),
            entry("create_pr", "create_pr", "github"),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("search").unwrap().origin_backend, "github");
        assert!(snapshot.get("missing").is_none());
        assert_eq!(snapshot.external_names(), vec!["search", "create_pr"]);
    }

    #[test]
    fn test_entry_renders_as_tool() {
        let tool = entry("search_github", "search", "github").to_tool();
        assert_eq!(tool.name, "search_github");
        assert_eq!(tool.input_schema, json!({"type": "object"}));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RegistrySnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.tools().is_empty());
    }
}
