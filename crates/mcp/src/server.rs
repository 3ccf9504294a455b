// MCP server: JSON-RPC 2.0 over newline-delimited stdio

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo, ToolContent,
    ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::bulk::{bulk_schemas, call_bulk, is_bulk_tool};
use anyhow::{Context, Result};
use fsops_core::{
    BatchConfig, BatchCoordinator, CallDescriptor, CallOutcome, Dispatcher, ToolRegistry,
};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

pub struct McpServer {
    registry: Arc<ToolRegistry>,
    coordinator: BatchCoordinator,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, batch: BatchConfig) -> Self {
        let registry = Arc::new(registry);
        let coordinator = BatchCoordinator::new(Dispatcher::new(registry.clone()), batch);
        Self {
            registry,
            coordinator,
        }
    }

    /// Serve requests on stdin/stdout until stdin closes
    pub async fn start(&self) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        while let Some(line) = lines.next().await {
            let response = match line {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.handle_line(&line).await
                }
                Err(LinesCodecError::MaxLineLengthExceeded) => {
                    tracing::warn!("Discarding request over {} bytes", MAX_LINE_LENGTH);
                    Some(JsonRpcResponse::error(
                        serde_json::Value::Null,
                        JsonRpcError::parse_error("request too large"),
                    ))
                }
                Err(LinesCodecError::Io(e)) => {
                    return Err(e).context("Failed to read from input");
                }
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response).context("Failed to encode response")?;
                sink.send(json).await.context("Failed to write response")?;
            }
        }

        tracing::info!("Input closed, MCP server shutting down");
        Ok(())
    }

    /// Handle one raw line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse JSON-RPC request");
                return Some(JsonRpcResponse::error(
                    serde_json::Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(serde_json::Value::Null),
                JsonRpcError::invalid_request(format!(
                    "unsupported jsonrpc version {}",
                    request.jsonrpc
                )),
            ));
        }

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        };

        tracing::debug!(method = %request.method, "Request received");

        let result = match request.method.as_str() {
            "initialize" => to_value(self.initialize(request.params)),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_value(self.list_tools()),
            "tools/call" => match parse_params::<CallToolParams>(request.params) {
                Ok(params) => self.call_tool(params).await.and_then(to_value),
                Err(e) => Err(e),
            },
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn initialize(&self, params: Option<serde_json::Value>) -> InitializeResult {
        match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => tracing::info!(
                client = %params.client_info.name,
                client_version = %params.client_info.version,
                protocol_version = %params.protocol_version,
                "Client connected"
            ),
            Some(Err(e)) => tracing::debug!(error = %e, "Initialize without client info"),
            None => {}
        }

        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "fsops".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    fn list_tools(&self) -> ListToolsResult {
        let mut tools = self.registry.list_schemas();
        tools.extend(bulk_schemas());
        ListToolsResult { tools }
    }

    async fn call_tool(&self, params: CallToolParams) -> Result<CallToolResult, JsonRpcError> {
        if is_bulk_tool(&params.name) {
            return call_bulk(&self.coordinator, &params.name, params.arguments).await;
        }

        let result = self
            .coordinator
            .dispatcher()
            .dispatch(0, CallDescriptor::new(params.name, params.arguments))
            .await;

        Ok(match result.outcome {
            CallOutcome::Ok { value } => {
                let text = match &value {
                    serde_json::Value::String(text) => text.clone(),
                    other => serde_json::to_string_pretty(other).map_err(|e| {
                        JsonRpcError::internal_error(format!("Failed to encode result: {}", e))
                    })?,
                };
                CallToolResult {
                    content: vec![ToolContent::text(text)],
                    structured_content: Some(serde_json::json!({ "result": value })),
                    is_error: None,
                }
            }
            CallOutcome::Error { error } => CallToolResult {
                content: vec![ToolContent::error(format!("[{}] {}", error.kind, error.message))],
                structured_content: Some(serde_json::json!({ "error": error })),
                is_error: Some(true),
            },
        })
    }
}

fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Result<T, JsonRpcError> {
    let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_value(value: impl Serialize) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::tools::build_registry;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server() -> McpServer {
        let config = ServerConfig::default();
        McpServer::new(build_registry(&config).unwrap(), config.bulk)
    }

    async fn call(server: &McpServer, method: &str, params: serde_json::Value) -> JsonRpcResponse {
        server
            .handle_request(JsonRpcRequest::new(1, method, params))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = call(&server(), "initialize", json!({})).await;
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "fsops");
    }

    #[tokio::test]
    async fn test_initialize_with_client_info() {
        let response = call(
            &server(),
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "inspector", "version": "0.1.0"}
            }),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
    }

    #[test]
    fn test_initialize_params_parse() {
        let params: InitializeParams = serde_json::from_value(json!({
            "protocolVersion": "2024-11-05",
            "clientInfo": {"name": "inspector"}
        }))
        .unwrap();
        assert_eq!(params.client_info.name, "inspector");
        assert!(params.client_info.version.is_empty());
        assert!(params.capabilities.is_null());
    }

    #[tokio::test]
    async fn test_list_tools_includes_bulk_tools() {
        let response = call(&server(), "tools/list", json!({})).await;
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();

        assert_eq!(names.len(), 13);
        assert!(names.contains(&"file_read"));
        assert!(names.contains(&"call_tool_bulk"));
        assert!(names.contains(&"call_tools_bulk"));
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response = server()
            .handle_request(JsonRpcRequest::notification("notifications/initialized"))
            .await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&server(), "resources/list", json!({})).await;
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = server().handle_line("{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::PARSE_ERROR);
        assert_eq!(response.id, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_single_call_error_is_tool_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.txt");

        let response = call(
            &server(),
            "tools/call",
            json!({"name": "file_read", "arguments": {"path": path}}),
        )
        .await;

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["error"]["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_single_call_success() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello there").unwrap();

        let response = call(
            &server(),
            "tools/call",
            json!({"name": "file_read", "arguments": {"path": path}}),
        )
        .await;

        let result = response.result.unwrap();
        assert!(result.get("isError").is_none());
        assert_eq!(result["content"][0]["text"], "hello there");
    }

    #[tokio::test]
    async fn test_tools_call_without_params() {
        let response = server()
            .handle_request(JsonRpcRequest {
                jsonrpc: "2.0".to_string(),
                id: Some(json!(7)),
                method: "tools/call".to_string(),
                params: None,
            })
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_serve_over_stream() {
        let (client, server_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let (client_read, mut client_write) = tokio::io::split(client);

        let handle = tokio::spawn(async move { server().serve(server_read, server_write).await });

        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
            .await
            .unwrap();
        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}\n")
            .await
            .unwrap();

        let mut replies = BufReader::new(client_read).lines();
        let line = replies.next_line().await.unwrap().unwrap();
        let response: JsonRpcResponse = serde_json::from_str(&line).unwrap();
        assert_eq!(response.id, json!(3));
        assert_eq!(response.result, Some(json!({})));

        drop(client_write);
        drop(replies);
        handle.await.unwrap().unwrap();
    }
}
