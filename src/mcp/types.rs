//! MCP types and structures
//!
//! Wire-level type definitions for the inbound stdio protocol and the
//! outbound backend protocol. Both sides speak the same JSON-RPC tool
//! methods, so one set of types covers both directions.

use crate::error::Result;
use crate::mcp::errors::McpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP Tool definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (unique identifier)
    pub name: String,
    /// Human-readable description (optional for compatibility)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl Tool {
    /// Create a new Tool with validation
    pub fn new(name: String, description: Option<String>, input_schema: Value) -> Result<Self> {
        let tool = Tool {
            name,
            description,
            input_schema,
        };

        tool.validate()?;
        Ok(tool)
    }

    /// Validate the tool definition
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::BridgeError::mcp("Tool name cannot be empty"));
        }

        if !self.input_schema.is_object() {
            return Err(crate::error::BridgeError::mcp(format!(
                "Input schema for tool '{}' must be a JSON object",
                self.name
            )));
        }

        Ok(())
    }
}

/// Tool call request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name to call
    pub name: String,
    /// Arguments for the tool
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(name: String, arguments: Value) -> Self {
        Self { name, arguments }
    }

    /// Validate the tool call
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::BridgeError::mcp("Tool call name cannot be empty"));
        }

        Ok(())
    }
}

/// MCP-compliant content types for tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    /// Text content
    #[serde(rename = "text")]
    Text {
        /// Text content
        text: String,
    },
    /// Image content (base64 encoded)
    #[serde(rename = "image")]
    Image {
        /// Base64 encoded image data
        data: String,
        /// MIME type (e.g., "image/png")
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Resource link content
    #[serde(rename = "resource")]
    Resource {
        /// Resource URI
        uri: String,
        /// Optional resource text content
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Optional MIME type
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl ToolContent {
    /// Create text content
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Tool call result (MCP-compliant format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call was successful
    pub success: bool,
    /// MCP-compliant error flag (required by MCP specification)
    #[serde(rename = "isError")]
    pub is_error: bool,
    /// Content array for MCP-compliant responses
    pub content: Vec<ToolContent>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResult {
    /// Create a successful result with custom content
    pub fn success_with_content(content: Vec<ToolContent>) -> Self {
        Self {
            success: true,
            is_error: false,
            content,
            error: None,
            metadata: None,
        }
    }

    /// Create a successful result with a single text block
    pub fn success_text<S: Into<String>>(text: S) -> Self {
        Self::success_with_content(vec![ToolContent::text(text)])
    }

    /// Create an error result
    pub fn error(error: String) -> Self {
        let content = vec![ToolContent::text(format!("Error: {}", error))];
        Self {
            success: false,
            is_error: true,
            content,
            error: Some(error),
            metadata: None,
        }
    }

    /// Create an error result with metadata
    pub fn error_with_metadata(error: String, metadata: Value) -> Self {
        let content = vec![ToolContent::text(format!("Error: {}", error))];
        Self {
            success: false,
            is_error: true,
            content,
            error: Some(error),
            metadata: Some(metadata),
        }
    }

    /// Validate the result structure (MCP-compliant)
    pub fn validate(&self) -> Result<()> {
        if self.success && self.is_error {
            return Err(crate::error::BridgeError::mcp(
                "Result cannot be both successful and error"
            ));
        }

        if !self.success && self.error.is_none() {
            return Err(crate::error::BridgeError::mcp(
                "Failed result must have an error message"
            ));
        }

        if self.content.is_empty() {
            return Err(crate::error::BridgeError::mcp(
                "Tool result must have at least one content item"
            ));
        }

        Ok(())
    }
}

/// MCP Request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID (string, number, or absent for notifications)
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Parameters
    pub params: Option<Value>,
}

/// MCP Response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID this responds to
    pub id: Option<Value>,
    /// Result (if successful)
    pub result: Option<Value>,
    /// Error (if failed)
    pub error: Option<McpError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_serializes_with_camel_case_schema() {
        let tool = Tool::new(
            "search".to_string(),
            Some("Search the index".to_string()),
            json!({"type": "object", "properties": {}}),
        )
        .unwrap();

        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("inputSchema").is_some());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn test_tool_without_description_omits_field() {
        let tool = Tool::new("t".to_string(), None, json!({"type": "object"})).unwrap();
        let value = serde_json::to_value(&tool).unwrap();
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_tool_rejects_empty_name() {
        assert!(Tool::new("  ".to_string(), None, json!({})).is_err());
    }

    #[test]
    fn test_tool_result_error_shape() {
        let result = ToolResult::error("backend unreachable".to_string());
        assert!(result.is_error);
        assert!(!result.success);
        assert_eq!(result.content.len(), 1);
        result.validate().unwrap();

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["isError"], json!(true));
        assert_eq!(value["content"][0]["type"], json!("text"));
    }

    #[test]
    fn test_tool_content_tagged_serialization() {
        let content = ToolContent::text("hello");
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value, json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn test_request_with_numeric_id_parses() {
        let raw = r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#;
        let request: McpRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.id, Some(json!(7)));
        assert!(request.params.is_none());
    }

    #[test]
    fn test_tool_call_default_arguments() {
        let call: ToolCall = serde_json::from_value(json!({"name": "search"})).unwrap();
        assert_eq!(call.arguments, Value::Null);
        call.validate().unwrap();
    }
}
