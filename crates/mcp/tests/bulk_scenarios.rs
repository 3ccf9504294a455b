// End-to-end bulk call scenarios through the MCP request handler

use fsops_mcp::config::ServerConfig;
use fsops_mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use fsops_mcp::server::McpServer;
use fsops_mcp::tools::build_registry;
use serde_json::{json, Value};
use tempfile::TempDir;

fn server_with(config: ServerConfig) -> McpServer {
    McpServer::new(build_registry(&config).unwrap(), config.bulk)
}

fn server() -> McpServer {
    server_with(ServerConfig::default())
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> JsonRpcResponse {
    server
        .handle_request(JsonRpcRequest::new(
            1,
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        ))
        .await
        .expect("request with id gets a response")
}

fn results_of(response: &JsonRpcResponse) -> Vec<Value> {
    let result = response.result.as_ref().expect("bulk call succeeded");
    result["structuredContent"]["results"]
        .as_array()
        .expect("results array")
        .clone()
}

#[tokio::test]
async fn delete_same_file_twice() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a");
    std::fs::write(&path, "x").unwrap();

    let response = call_tool(
        &server(),
        "call_tool_bulk",
        json!({
            "tool": "file_delete",
            "tool_arguments": [{"path": path}, {"path": path}]
        }),
    )
    .await;

    let results = results_of(&response);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["status"], "ok");
    assert_eq!(results[1]["status"], "error");
    assert_eq!(results[1]["error"]["kind"], "not_found");
    assert!(!path.exists());
}

#[tokio::test]
async fn heterogeneous_workflow() {
    let dir = TempDir::new().unwrap();
    let folder = dir.path().join("x");
    let file = folder.join("y.txt");

    let response = call_tool(
        &server(),
        "call_tools_bulk",
        json!({
            "tool_calls": [
                {"tool": "folder_create", "arguments": {"path": folder}},
                {"tool": "file_create", "arguments": {"path": file, "content": "hi"}},
                {"tool": "file_read", "arguments": {"path": file}}
            ]
        }),
    )
    .await;

    let results = results_of(&response);
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["status"] == "ok"));
    assert_eq!(results[2]["value"], "hi");
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result["index"], i);
    }
}

#[tokio::test]
async fn empty_batch_is_not_an_error() {
    let server = server();

    let response = call_tool(&server, "call_tool_bulk", json!({"tool": "file_read", "tool_arguments": []})).await;
    assert!(results_of(&response).is_empty());

    let response = call_tool(&server, "call_tools_bulk", json!({"tool_calls": []})).await;
    assert!(results_of(&response).is_empty());
}

#[tokio::test]
async fn failures_stay_with_their_entry() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("exists.txt");
    std::fs::write(&existing, "present").unwrap();
    let folder = dir.path().join("full");
    std::fs::create_dir(&folder).unwrap();
    std::fs::write(folder.join("child.txt"), "").unwrap();

    let response = call_tool(
        &server(),
        "call_tools_bulk",
        json!({
            "tool_calls": [
                {"tool": "file_read", "arguments": {"path": existing}},
                {"tool": "no_such_tool", "arguments": {}},
                {"tool": "file_create", "arguments": {"path": existing}},
                {"tool": "folder_delete", "arguments": {"path": folder}},
                {"tool": "file_create", "arguments": {"path": existing, "content": "again"}}
            ]
        }),
    )
    .await;

    let results = results_of(&response);
    assert_eq!(results.len(), 5);
    assert_eq!(results[0]["value"], "present");
    assert_eq!(results[1]["error"]["kind"], "unknown_tool");
    assert_eq!(results[2]["error"]["kind"], "invalid_arguments");
    assert_eq!(results[3]["error"]["kind"], "not_empty");
    assert_eq!(results[4]["error"]["kind"], "already_exists");
    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "present");
}

#[tokio::test]
async fn disabled_tool_is_unknown_in_bulk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.txt");
    std::fs::write(&path, "keep").unwrap();

    let mut config = ServerConfig::default();
    config.tools.disabled_file_tools = vec!["delete".to_string()];
    let server = server_with(config);

    let response = call_tool(
        &server,
        "call_tools_bulk",
        json!({
            "tool_calls": [
                {"tool": "file_delete", "arguments": {"path": path}},
                {"tool": "file_read", "arguments": {"path": path}}
            ]
        }),
    )
    .await;

    let results = results_of(&response);
    assert_eq!(results[0]["error"]["kind"], "unknown_tool");
    assert_eq!(results[1]["value"], "keep");
    assert!(path.exists());
}

#[tokio::test]
async fn concurrent_deletes_on_independent_paths() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<_> = (0..10).map(|i| dir.path().join(format!("f{}.txt", i))).collect();
    for path in paths.iter().take(7) {
        std::fs::write(path, "x").unwrap();
    }

    let mut config = ServerConfig::default();
    config.bulk.max_concurrency = 4;
    let server = server_with(config);

    let arguments: Vec<Value> = paths.iter().map(|p| json!({"path": p})).collect();
    let response = call_tool(
        &server,
        "call_tool_bulk",
        json!({"tool": "file_delete", "tool_arguments": arguments}),
    )
    .await;

    let results = results_of(&response);
    assert_eq!(results.len(), 10);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result["index"], i);
        if i < 7 {
            assert_eq!(result["status"], "ok", "entry {}", i);
        } else {
            assert_eq!(result["error"]["kind"], "not_found", "entry {}", i);
        }
    }
}

#[tokio::test]
async fn oversized_batch_is_rejected_as_a_whole() {
    let mut config = ServerConfig::default();
    config.bulk.max_batch_size = 2;
    let server = server_with(config);

    let response = call_tool(
        &server,
        "call_tool_bulk",
        json!({"tool": "file_read", "tool_arguments": [{"path": "a"}, {"path": "b"}, {"path": "c"}]}),
    )
    .await;

    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, -32602);
}
