//! MCP notifications
//!
//! Outbound notification fan-out for the stdio transport. The dispatcher
//! fires `notifications/tools/list_changed` after a registry swap; whether
//! the connected host honors it is out of our hands, so sends are
//! best-effort and never fail the caller.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// An MCP notification message (a request without an id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpNotification {
    /// Method name
    pub method: String,
    /// Optional parameters
    pub params: Option<Value>,
}

impl McpNotification {
    /// Create a notification without parameters
    pub fn new<S: Into<String>>(method: S) -> Self {
        Self {
            method: method.into(),
            params: None,
        }
    }

    /// Create a notification with parameters
    pub fn with_params<S: Into<String>>(method: S, params: Value) -> Self {
        Self {
            method: method.into(),
            params: Some(params),
        }
    }

    /// The tools list_changed notification
    pub fn tools_list_changed() -> Self {
        Self::new("notifications/tools/list_changed")
    }
}

/// Notification capabilities advertised by the server
#[derive(Debug, Clone)]
pub struct NotificationCapabilities {
    /// Whether tools list_changed notifications are supported
    pub tools_list_changed: bool,
}

impl Default for NotificationCapabilities {
    fn default() -> Self {
        Self {
            tools_list_changed: true,
        }
    }
}

/// MCP notification manager
pub struct McpNotificationManager {
    /// Broadcast channel for notifications
    notification_sender: broadcast::Sender<McpNotification>,
    /// Capability flags
    capabilities: NotificationCapabilities,
}

impl McpNotificationManager {
    /// Create a new notification manager
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self {
            notification_sender: sender,
            capabilities: NotificationCapabilities::default(),
        }
    }

    /// Create a notification manager with specific capabilities
    pub fn with_capabilities(capabilities: NotificationCapabilities) -> Self {
        let (sender, _) = broadcast::channel(1000);
        Self {
            notification_sender: sender,
            capabilities,
        }
    }

    /// Get the notification capabilities
    pub fn capabilities(&self) -> &NotificationCapabilities {
        &self.capabilities
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<McpNotification> {
        self.notification_sender.subscribe()
    }

    /// Send a notification
    fn send_notification(&self, notification: McpNotification) -> Result<()> {
        debug!("Sending MCP notification: {}", notification.method);

        if let Err(e) = self.notification_sender.send(notification) {
            debug!("No subscribers for notification: {}", e);
        }

        Ok(())
    }

    /// Notify that the tools list has changed
    pub fn notify_tools_list_changed(&self) -> Result<()> {
        if !self.capabilities.tools_list_changed {
            debug!("Tools list_changed notifications not supported");
            return Ok(());
        }

        info!("Tools list changed - sending notification");
        let notification = McpNotification::tools_list_changed();
        self.send_notification(notification)
    }
}

impl Default for McpNotificationManager {
    fn default() -> Self {
        Self::new()
    }
}
