//! Discovery engine
//!
//! Walks the resolved backends one at a time and lists the tools each one
//! exposes. Backends are contacted sequentially because connection setup is
//! expensive and some backends rate-limit connection bursts. A failure is
//! scoped to its backend: the backend contributes zero tools and the walk
//! continues.
//!
//! The engine also owns the process-wide discovery state and its watch
//! channel. The state is monotonic; once a terminal state is reached no
//! further transitions are accepted.

use crate::auth::TokenProvider;
use crate::discovery::resolver::BackendDescriptor;
use crate::error::Result;
use crate::mcp::clients::{HttpClientConfig, HttpMcpClient, IdentityHeader};
use crate::registry::DiscoveredTool;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Lifecycle of the single discovery pass this process runs
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryState {
    /// Discovery has not been launched yet
    NotStarted,
    /// The background pass is in flight
    Running,
    /// The pass finished and the live registry is authoritative
    Complete,
    /// The pass could not proceed at all (resolution failed)
    Failed(String),
}

impl DiscoveryState {
    /// Terminal states accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, DiscoveryState::Complete | DiscoveryState::Failed(_))
    }
}

/// Tools one backend reported during the pass
#[derive(Debug, Clone)]
pub struct BackendDiscovery {
    /// The backend that was queried
    pub descriptor: BackendDescriptor,
    /// Tools it reported, tagged with its name
    pub tools: Vec<DiscoveredTool>,
}

/// Sequential tool discovery across all resolved backends
pub struct DiscoveryEngine {
    token_provider: Arc<dyn TokenProvider>,
    request_timeout_secs: u64,
    identity_header: Option<IdentityHeader>,
    state_tx: watch::Sender<DiscoveryState>,
}

impl DiscoveryEngine {
    /// Create an engine in the `NotStarted` state
    pub fn new(
        token_provider: Arc<dyn TokenProvider>,
        request_timeout_secs: u64,
        identity_header: Option<IdentityHeader>,
    ) -> Self {
        let (state_tx, _) = watch::channel(DiscoveryState::NotStarted);
        Self {
            token_provider,
            request_timeout_secs,
            identity_header,
            state_tx,
        }
    }

    /// Current discovery state
    pub fn state(&self) -> DiscoveryState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state transitions; used by call-side waiters
    pub fn subscribe(&self) -> watch::Receiver<DiscoveryState> {
        self.state_tx.subscribe()
    }

    /// Mark the pass running
    pub fn mark_running(&self) {
        self.set_state(DiscoveryState::Running);
    }

    /// Mark the pass complete; must happen after the live registry is in place
    pub fn mark_complete(&self) {
        self.set_state(DiscoveryState::Complete);
    }

    /// Mark the pass failed with a human-readable reason
    pub fn mark_failed<S: Into<String>>(&self, reason: S) {
        self.set_state(DiscoveryState::Failed(reason.into()));
    }

    fn set_state(&self, next: DiscoveryState) {
        let current = self.state_tx.borrow().clone();
        if current.is_terminal() {
            warn!(
                "Ignoring discovery state change to {:?} after terminal {:?}",
                next, current
            );
            return;
        }
        if current == next {
            return;
        }
        debug!("Discovery state: {:?} -> {:?}", current, next);
        self.state_tx.send_replace(next);
    }

    /// List tools from every backend, one at a time
    ///
    /// The aggregate is best-effort: unreachable backends are logged and
    /// skipped, and the caller receives whatever the reachable ones reported.
    pub async fn discover_all(&self, descriptors: &[BackendDescriptor]) -> Vec<BackendDiscovery> {
        let mut results = Vec::with_capacity(descriptors.len());
        let mut failed = 0usize;

        for descriptor in descriptors {
            match self.discover_backend(descriptor).await {
                Ok(tools) => {
                    info!(
                        "Discovered {} tools from backend '{}'",
                        tools.len(),
                        descriptor.name
                    );
                    results.push(BackendDiscovery {
                        descriptor: descriptor.clone(),
                        tools,
                    });
                }
                Err(e) => {
                    failed += 1;
                    error!("Skipping backend '{}': {}", descriptor.name, e);
                }
            }
        }

        info!(
            "Discovery pass finished: {}/{} backends reachable",
            descriptors.len() - failed,
            descriptors.len()
        );
        results
    }

    /// Open a short-lived connection to one backend and list its tools
    ///
    /// The client (and its connection pool) is dropped on return; calls made
    /// later open their own connections with fresh tokens.
    async fn discover_backend(&self, descriptor: &BackendDescriptor) -> Result<Vec<DiscoveredTool>> {
        let client = HttpMcpClient::new(
            HttpClientConfig {
                base_url: descriptor.url.clone(),
                timeout: self.request_timeout_secs,
                scope: descriptor.scope.clone(),
                identity_header: self.identity_header.clone(),
            },
            descriptor.name.clone(),
            self.token_provider.clone(),
        )?;

        let tools = client.list_tools().await?;
        Ok(tools
            .into_iter()
            .map(|tool| DiscoveredTool {
                name: tool.name,
                description: tool.description,
                input_schema: tool.input_schema,
                origin_backend: descriptor.name.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::NoAuthTokenProvider;

    fn engine() -> DiscoveryEngine {
        DiscoveryEngine::new(Arc::new(NoAuthTokenProvider), 1, None)
    }

    #[test]
    fn test_initial_state_is_not_started() {
        assert_eq!(engine().state(), DiscoveryState::NotStarted);
    }

    #[test]
    fn test_running_then_complete() {
        let engine = engine();
        engine.mark_running();
        assert_eq!(engine.state(), DiscoveryState::Running);
        engine.mark_complete();
        assert_eq!(engine.state(), DiscoveryState::Complete);
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let engine = engine();
        engine.mark_running();
        engine.mark_complete();
        engine.mark_failed("too late");
        assert_eq!(engine.state(), DiscoveryState::Complete);

        let engine = self::engine();
        engine.mark_running();
        engine.mark_failed("gateway down");
        engine.mark_complete();
        assert_eq!(
            engine.state(),
            DiscoveryState::Failed("gateway down".to_string())
        );
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let engine = engine();
        let mut rx = engine.subscribe();

        engine.mark_running();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), DiscoveryState::Running);

        engine.mark_complete();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_terminal());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_skipped_without_error() {
        let engine = engine();
        let descriptors = vec![BackendDescriptor {
            name: "dead".to_string(),
            url: "http://127.0.0.1:1/".to_string(),
            scope: None,
        }];

        let results = engine.discover_all(&descriptors).await;
        assert!(results.is_empty());
    }
}
