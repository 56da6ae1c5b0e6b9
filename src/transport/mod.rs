//! Transport layer implementations for MCP protocol
//!
//! Supports two transport methods:
//! - stdio: newline-delimited JSON-RPC for local MCP clients
//! - http: JSON-RPC over HTTP plus convenience REST routes

pub mod http;
pub mod stdio;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

pub const JSONRPC_VERSION: &str = "2.0";
/// JSON-RPC "parse error"
pub const PARSE_ERROR: i32 = -32700;

/// JSON-RPC 2.0 message wrapper for proper serialization.
///
/// Variant order matters for untagged decoding: anything carrying a
/// `method` is a request or notification, the rest are responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Request {
        jsonrpc: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    Response {
        jsonrpc: String,
        id: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<McpError>,
    },
}

/// MCP message types (internal representation)
#[derive(Debug, Clone)]
pub enum McpMessage {
    Initialize {
        id: Value,
        params: InitializeParams,
    },
    ToolsList {
        id: Value,
    },
    ToolsCall {
        id: Value,
        params: ToolsCallParams,
    },
    Ping {
        id: Value,
    },
    /// Request for a method this server does not implement
    Unsupported {
        id: Value,
        method: String,
    },
    Notification {
        method: String,
        params: Option<Value>,
    },
    Response {
        id: Value,
        result: Option<Value>,
        error: Option<McpError>,
    },
}

/// Initialize parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub client_info: ClientInfo,
}

/// Client info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "unknown".to_string(),
            version: String::new(),
        }
    }
}

/// Tool call parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// MCP error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl McpMessage {
    pub fn result(id: Value, result: Value) -> Self {
        McpMessage::Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: McpError) -> Self {
        McpMessage::Response {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Convert MCP message to JSON-RPC message for serialization
    pub fn to_jsonrpc(&self) -> JsonRpcMessage {
        let request = |id: &Value, method: &str, params: Option<Value>| JsonRpcMessage::Request {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.clone()),
            method: method.to_string(),
            params,
        };

        match self {
            McpMessage::Initialize { id, params } => request(id, "initialize", serde_json::to_value(params).ok()),
            McpMessage::ToolsList { id } => request(id, "tools/list", None),
            McpMessage::ToolsCall { id, params } => request(id, "tools/call", serde_json::to_value(params).ok()),
            McpMessage::Ping { id } => request(id, "ping", None),
            McpMessage::Unsupported { id, method } => request(id, method, None),
            McpMessage::Notification { method, params } => JsonRpcMessage::Request {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id: None,
                method: method.clone(),
                params: params.clone(),
            },
            McpMessage::Response { id, result, error } => JsonRpcMessage::Response {
                jsonrpc: JSONRPC_VERSION.to_string(),
                id: id.clone(),
                result: result.clone(),
                error: error.clone(),
            },
        }
    }

    /// Convert JSON-RPC message to MCP message
    pub fn from_jsonrpc(jsonrpc: JsonRpcMessage) -> Result<Self> {
        match jsonrpc {
            JsonRpcMessage::Request {
                id: None, method, params, ..
            } => Ok(McpMessage::Notification { method, params }),
            JsonRpcMessage::Request {
                id: Some(id),
                method,
                params,
                ..
            } => match method.as_str() {
                "initialize" => {
                    let params: InitializeParams = match params {
                        Some(p) => serde_json::from_value(p)
                            .map_err(|e| anyhow::Error::new(e).context("Failed to parse initialize params"))?,
                        None => InitializeParams::default(),
                    };
                    Ok(McpMessage::Initialize { id, params })
                }
                "tools/list" => Ok(McpMessage::ToolsList { id }),
                "tools/call" => {
                    let params: ToolsCallParams = match params {
                        Some(p) => serde_json::from_value(p)
                            .map_err(|e| anyhow::Error::new(e).context("Failed to parse tool call params"))?,
                        None => return Err(anyhow::Error::msg("Missing tool call params")),
                    };
                    Ok(McpMessage::ToolsCall { id, params })
                }
                "ping" => Ok(McpMessage::Ping { id }),
                _ => Ok(McpMessage::Unsupported { id, method }),
            },
            JsonRpcMessage::Response { id, result, error, .. } => Ok(McpMessage::Response { id, result, error }),
        }
    }

    /// Request id, if the message carries one
    pub fn id(&self) -> Option<&Value> {
        match self {
            McpMessage::Initialize { id, .. }
            | McpMessage::ToolsList { id }
            | McpMessage::ToolsCall { id, .. }
            | McpMessage::Ping { id }
            | McpMessage::Unsupported { id, .. }
            | McpMessage::Response { id, .. } => Some(id),
            McpMessage::Notification { .. } => None,
        }
    }
}

impl JsonRpcMessage {
    /// Create JsonRpcMessage from a JSON Value
    pub fn from_json_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| anyhow::Error::new(e).context("Failed to parse JSON-RPC message"))
    }

    /// Convert to MCP message
    pub fn to_mcp_message(self) -> Result<McpMessage> {
        McpMessage::from_jsonrpc(self)
    }

    /// Convert to JSON Value
    pub fn to_json_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Error response for input that could not be decoded
    pub fn parse_error(message: impl Into<String>) -> Self {
        JsonRpcMessage::Response {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::Null,
            result: None,
            error: Some(McpError::new(PARSE_ERROR, message)),
        }
    }
}

/// Message handler trait for processing incoming MCP messages
#[async_trait]
pub trait MessageHandler {
    /// Handle an incoming MCP message
    async fn handle_message(&self, message: McpMessage) -> Result<Option<McpMessage>>;
}

/// Trait for all transport implementations
#[async_trait]
pub trait Transport {
    /// Start the transport and begin handling connections
    async fn start(&self, handler: Box<dyn MessageHandler + Send + Sync>) -> Result<()>;

    /// Stop the transport gracefully
    async fn shutdown(&self) -> Result<()>;
}
