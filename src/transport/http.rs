//! HTTP transport implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use super::{JsonRpcMessage, McpMessage, MessageHandler, ToolsCallParams};

/// HTTP transport for web applications and remote access
#[derive(Clone)]
pub struct HttpTransport {
    port: u16,
    host: String,
    shutdown: Arc<Notify>,
}

/// HTTP request for MCP tool calls
#[derive(Debug, Default, Deserialize)]
pub struct McpToolRequest {
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// HTTP response for MCP operations
#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub success: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn MessageHandler + Send + Sync>,
}

impl HttpTransport {
    /// Create a new HTTP transport instance
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            port,
            host: host.into(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create the Axum router with all routes and middleware
    pub fn create_router(&self, handler: Arc<dyn MessageHandler + Send + Sync>) -> Router {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(Any);

        Router::new()
            .route("/mcp", post(handle_jsonrpc))
            .route("/mcp/tools/list", get(handle_tools_list))
            .route("/mcp/tools/{tool_name}", post(handle_tool_call))
            .route("/health", get(handle_health_check))
            .layer(cors)
            .with_state(AppState { handler })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new("127.0.0.1", 3000)
    }
}

#[async_trait]
impl super::Transport for HttpTransport {
    /// Start the HTTP transport server
    async fn start(&self, handler: Box<dyn MessageHandler + Send + Sync>) -> Result<()> {
        let app = self.create_router(Arc::from(handler));
        let addr = self.address();

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))?;
        info!("HTTP server listening on http://{}", addr);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.notified().await })
            .await
            .context("HTTP server error")?;

        Ok(())
    }

    /// Shutdown the HTTP transport
    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down HTTP transport");
        self.shutdown.notify_waiters();
        Ok(())
    }
}

/// Synthetic id for requests arriving over the REST routes
fn rest_request_id() -> Value {
    json!(chrono::Utc::now().timestamp_millis())
}

/// Raw JSON-RPC over POST
async fn handle_jsonrpc(State(state): State<AppState>, body: String) -> Response {
    let decoded = serde_json::from_str::<Value>(&body)
        .map_err(anyhow::Error::new)
        .and_then(JsonRpcMessage::from_json_value)
        .and_then(JsonRpcMessage::to_mcp_message);

    let message = match decoded {
        Ok(message) => message,
        Err(e) => {
            debug!("Rejecting JSON-RPC body: {:#}", e);
            let reply = JsonRpcMessage::parse_error(format!("Parse error: {:#}", e));
            return (StatusCode::OK, Json(reply)).into_response();
        }
    };

    match state.handler.handle_message(message).await {
        Ok(Some(response)) => (StatusCode::OK, Json(response.to_jsonrpc())).into_response(),
        Ok(None) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            error!("JSON-RPC handler error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

/// Map a handler reply onto the REST envelope
fn rest_response(reply: Result<Option<McpMessage>>) -> (StatusCode, Json<McpResponse>) {
    match reply {
        Ok(Some(McpMessage::Response { result, error, .. })) => {
            let tool_failed = result
                .as_ref()
                .and_then(|r| r.get("isError"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let response = McpResponse {
                success: error.is_none() && !tool_failed,
                result,
                error: error.map(|e| e.message),
            };
            (StatusCode::OK, Json(response))
        }
        Ok(_) => {
            let response = McpResponse {
                success: false,
                result: None,
                error: Some("No response generated".to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
        }
        Err(e) => {
            error!("HTTP request error: {}", e);
            let response = McpResponse {
                success: false,
                result: None,
                error: Some(e.to_string()),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(response))
        }
    }
}

/// Handle MCP tool calls via HTTP POST
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    request: Option<Json<McpToolRequest>>,
) -> impl IntoResponse {
    debug!("HTTP tool call: {}", tool_name);
    let arguments = request.and_then(|Json(request)| request.arguments);

    let mcp_message = McpMessage::ToolsCall {
        id: rest_request_id(),
        params: ToolsCallParams {
            name: tool_name,
            arguments,
        },
    };
    rest_response(state.handler.handle_message(mcp_message).await)
}

/// Handle MCP tools list request
async fn handle_tools_list(State(state): State<AppState>) -> impl IntoResponse {
    debug!("HTTP tools list request");
    let mcp_message = McpMessage::ToolsList { id: rest_request_id() };
    rest_response(state.handler.handle_message(mcp_message).await)
}

async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::VERSION.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    struct MockMessageHandler;

    #[async_trait]
    impl MessageHandler for MockMessageHandler {
        async fn handle_message(&self, message: McpMessage) -> Result<Option<McpMessage>> {
            match message {
                McpMessage::ToolsList { id } => Ok(Some(McpMessage::result(
                    id,
                    json!({ "tools": [{ "name": "test_tool", "description": "A test tool", "inputSchema": {} }] }),
                ))),
                McpMessage::ToolsCall { id, params } if params.name == "broken" => Ok(Some(McpMessage::result(
                    id,
                    json!({ "content": [{ "type": "text", "text": "Error: boom" }], "isError": true }),
                ))),
                McpMessage::ToolsCall { id, params } => Ok(Some(McpMessage::result(
                    id,
                    json!({ "called": params.name, "arguments": params.arguments }),
                ))),
                McpMessage::Ping { id } => Ok(Some(McpMessage::result(id, json!({})))),
                _ => Ok(None),
            }
        }
    }

    fn router() -> Router {
        HttpTransport::default().create_router(Arc::new(MockMessageHandler))
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_http_transport_creation() {
        let transport = HttpTransport::new("0.0.0.0", 3001);
        assert_eq!(transport.address(), "0.0.0.0:3001");
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn tools_list_route() {
        let (status, body) = send(Request::get("/mcp/tools/list").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["tools"][0]["name"], "test_tool");
    }

    #[tokio::test]
    async fn tool_call_route_forwards_arguments() {
        let (status, body) = send(post_json("/mcp/tools/echo", r#"{"arguments":{"setId":"abc"}}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["result"]["called"], "echo");
        assert_eq!(body["result"]["arguments"]["setId"], "abc");
    }

    #[tokio::test]
    async fn tool_failure_is_not_success() {
        let (_, body) = send(post_json("/mcp/tools/broken", "{}")).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["result"]["isError"], true);
    }

    #[tokio::test]
    async fn jsonrpc_route() {
        let (status, body) = send(post_json("/mcp", r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "jsonrpc": "2.0", "id": 9, "result": {} }));

        let (status, _) = send(post_json("/mcp", r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (_, body) = send(post_json("/mcp", "{oops")).await;
        assert_eq!(body["error"]["code"], -32700);
    }
}
