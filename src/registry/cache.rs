//! Disk cache for discovered tools
//!
//! Persists the registry's source data across restarts so tools/list can be
//! answered before live discovery finishes. A cache older than the TTL is
//! treated exactly like a missing file; staleness, parse failures and IO
//! failures on load all degrade to "no cache", never to an error.

use crate::error::{BridgeError, Result};
use crate::registry::types::DiscoveredTool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// One persisted tool record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedToolRecord {
    /// Tool name as reported by the backend
    pub name: String,
    /// Tool description
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// Raw input schema
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    /// Backend that reported the tool
    #[serde(rename = "serverName")]
    pub server_name: String,
    /// Capture timestamp in epoch milliseconds, shared by the whole batch
    pub timestamp: i64,
}

impl From<CachedToolRecord> for DiscoveredTool {
    fn from(record: CachedToolRecord) -> Self {
        DiscoveredTool {
            name: record.name,
            description: record.description,
            input_schema: record.input_schema,
            origin_backend: record.server_name,
        }
    }
}

/// On-disk file shape: one batch timestamp plus the records
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    /// Batch capture timestamp in epoch milliseconds
    timestamp: i64,
    /// Cached tool records
    tools: Vec<CachedToolRecord>,
}

/// Disk cache for the registry's source data
pub struct ToolCache {
    path: PathBuf,
    ttl_hours: u64,
}

impl ToolCache {
    /// Create a cache handle for the given file path and TTL
    pub fn new<P: Into<PathBuf>>(path: P, ttl_hours: u64) -> Self {
        Self {
            path: path.into(),
            ttl_hours,
        }
    }

    /// Cache file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist one discovery batch, overwriting any previous cache
    ///
    /// The write goes to a temporary file first and is renamed into place,
    /// so a crash mid-write cannot leave a truncated-but-parseable file.
    pub async fn save(&self, tools: &[DiscoveredTool]) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let records: Vec<CachedToolRecord> = tools
            .iter()
            .map(|tool| CachedToolRecord {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: tool.input_schema.clone(),
                server_name: tool.origin_backend.clone(),
                timestamp,
            })
            .collect();

        let file = CacheFile {
            timestamp,
            tools: records,
        };

        let json_content = serde_json::to_string_pretty(&file)
            .map_err(|e| BridgeError::registry(format!("Failed to serialize tool cache: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                BridgeError::registry(format!(
                    "Failed to create cache directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json_content).await.map_err(|e| {
            BridgeError::registry(format!(
                "Failed to write cache file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;
        fs::rename(&tmp_path, &self.path).await.map_err(|e| {
            BridgeError::registry(format!(
                "Failed to move cache file into place at '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        info!("Cached {} tools to {}", tools.len(), self.path.display());
        Ok(())
    }

    /// Load the cached batch, or None when missing, unparseable or stale
    pub async fn load(&self) -> Option<Vec<DiscoveredTool>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => {
                debug!("No tool cache at {}", self.path.display());
                return None;
            }
        };

        let file: CacheFile = match serde_json::from_str(&content) {
            Ok(file) => file,
            Err(e) => {
                warn!(
                    "Ignoring unparseable tool cache at {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        let age_ms = chrono::Utc::now().timestamp_millis() - file.timestamp;
        let ttl_ms = self.ttl_hours as i64 * 60 * 60 * 1000;
        if age_ms > ttl_ms {
            info!(
                "Tool cache at {} is stale ({}h old, TTL {}h), ignoring",
                self.path.display(),
                age_ms / (60 * 60 * 1000),
                self.ttl_hours
            );
            return None;
        }

        debug!(
            "Loaded {} cached tools from {} ({}m old)",
            file.tools.len(),
            self.path.display(),
            age_ms / (60 * 1000)
        );
        Some(file.tools.into_iter().map(DiscoveredTool::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn tool(name: &str, backend: &str) -> DiscoveredTool {
        DiscoveredTool {
            name: name.to_string(),
            description: Some("desc".to_string()),
            input_schema: json!({"type": "object"}),
            origin_backend: backend.to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_then_load_returns_batch() {
        let dir = tempdir().unwrap();
        let cache = ToolCache::new(dir.path().join("tools-cache.json"), 24);

        cache
            .save(&[tool("search", "github"), tool("query", "database")])
            .await
            .unwrap();

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "search");
        assert_eq!(loaded[0].origin_backend, "github");
    }

    #[tokio::test]
    async fn test_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let cache = ToolCache::new(dir.path().join("never-written.json"), 24);
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_file_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools-cache.json");
        std::fs::write(&path, "{not json").unwrap();

        let cache = ToolCache::new(path, 24);
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_stale_cache_is_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools-cache.json");

        // Timestamp 25 hours in the past against a 24 hour TTL
        let stale_ts = chrono::Utc::now().timestamp_millis() - 25 * 60 * 60 * 1000;
        let content = json!({
            "timestamp": stale_ts,
            "tools": [{
                "name": "search",
                "inputSchema": {"type": "object"},
                "serverName": "github",
                "timestamp": stale_ts
            }]
        });
        std::fs::write(&path, content.to_string()).unwrap();

        let cache = ToolCache::new(path, 24);
        assert!(cache.load().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_cache_within_ttl_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tools-cache.json");

        let fresh_ts = chrono::Utc::now().timestamp_millis() - 60 * 60 * 1000;
        let content = json!({
            "timestamp": fresh_ts,
            "tools": [{
                "name": "search",
                "description": "find things",
                "inputSchema": {"type": "object"},
                "serverName": "github",
                "timestamp": fresh_ts
            }]
        });
        std::fs::write(&path, content.to_string()).unwrap();

        let cache = ToolCache::new(path, 24);
        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].description.as_deref(), Some("find things"));
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_batch() {
        let dir = tempdir().unwrap();
        let cache = ToolCache::new(dir.path().join("tools-cache.json"), 24);

        cache.save(&[tool("a", "x"), tool("b", "x")]).await.unwrap();
        cache.save(&[tool("c", "y")]).await.unwrap();

        let loaded = cache.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "c");
    }
}
