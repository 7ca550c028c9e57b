//! Registry construction: cross-backend name deduplication
//!
//! External names stay equal to the backend's own tool names unless two
//! backends report the same name; every colliding tool then gets a
//! `_{backend}` suffix so callers can address each one unambiguously.

use crate::registry::sanitize::sanitize_schema;
use crate::registry::types::{DiscoveredTool, RegistryEntry, RegistrySnapshot};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Build an immutable snapshot from the tools of one discovery pass
///
/// Collision rules, in order:
/// - a name reported by more than one backend gets the `_{backend}` suffix
///   on every colliding tool, not just the later ones;
/// - the same backend reporting the same name twice is a caller
///   configuration error; the last report wins;
/// - a suffixed name clashing with another entry's name (a backend that
///   literally exposes `search_github`, say) keeps the first entry and drops
///   the later one with a warning.
pub fn build_snapshot(source_tools: Vec<DiscoveredTool>) -> RegistrySnapshot {
    debug!("Building registry snapshot from {} discovered tools", source_tools.len());

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for tool in &source_tools {
        *name_counts.entry(tool.name.as_str()).or_default() += 1;
    }

    let mut entries: Vec<RegistryEntry> = Vec::with_capacity(source_tools.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut collisions = 0usize;

    for tool in &source_tools {
        let external_name = if name_counts[tool.name.as_str()] > 1 {
            collisions += 1;
            format!("{}_{}", tool.name, tool.origin_backend)
        } else {
            tool.name.clone()
        };

        let entry = RegistryEntry {
            external_name: external_name.clone(),
            original_name: tool.name.clone(),
            origin_backend: tool.origin_backend.clone(),
            description: tool.description.clone(),
            sanitized_schema: sanitize_schema(tool.input_schema.clone()),
        };

        match index.get(&external_name) {
            None => {
                index.insert(external_name, entries.len());
                entries.push(entry);
            }
            Some(&existing_idx) => {
                let existing = &entries[existing_idx];
                if existing.original_name == entry.original_name
                    && existing.origin_backend == entry.origin_backend
                {
                    // Duplicate report from one backend: last write wins
                    warn!(
                        "Backend '{}' reported tool '{}' more than once, keeping the last definition",
                        entry.origin_backend, entry.original_name
                    );
                    entries[existing_idx] = entry;
                } else {
                    warn!(
                        "External name '{}' from backend '{}' clashes with an entry from backend '{}', dropping the later one",
                        external_name, entry.origin_backend, existing.origin_backend
                    );
                }
            }
        }
    }

    if collisions > 0 {
        info!(
            "Registry built with {} entries ({} cross-backend name collisions suffixed)",
            entries.len(),
            collisions
        );
    } else {
        debug!("Registry built with {} entries, no name collisions", entries.len());
    }

    RegistrySnapshot::from_entries(entries)
}
