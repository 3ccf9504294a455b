// Bulk tools: call one tool many times, or many tools once each, in one request

use crate::protocol::{CallToolResult, JsonRpcError, ToolContent, ToolSchema};
use fsops_core::registry::{json_schema_array, json_schema_object, json_schema_string};
use fsops_core::{BatchCoordinator, BatchError, CallDescriptor, CallResult};
use serde::Deserialize;
use serde_json::json;

pub const CALL_TOOL_BULK: &str = "call_tool_bulk";
pub const CALL_TOOLS_BULK: &str = "call_tools_bulk";

pub fn is_bulk_tool(name: &str) -> bool {
    name == CALL_TOOL_BULK || name == CALL_TOOLS_BULK
}

#[derive(Debug, Deserialize)]
struct CallToolBulkArgs {
    tool: String,
    tool_arguments: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CallToolsBulkArgs {
    tool_calls: Vec<CallDescriptor>,
}

pub fn bulk_schemas() -> Vec<ToolSchema> {
    vec![
        ToolSchema {
            name: CALL_TOOL_BULK.to_string(),
            description: "Call a single tool once per argument set, in order. Each call succeeds or fails on its own; results are returned in request order".to_string(),
            input_schema: json_schema_object(
                json!({
                    "tool": json_schema_string("Name of the tool to call"),
                    "tool_arguments": json_schema_array(
                        json!({ "type": "object" }),
                        "Argument objects, one per call"
                    )
                }),
                vec!["tool", "tool_arguments"],
            ),
        },
        ToolSchema {
            name: CALL_TOOLS_BULK.to_string(),
            description: "Call several tools, one call each, in order. Each call succeeds or fails on its own; results are returned in request order".to_string(),
            input_schema: json_schema_object(
                json!({
                    "tool_calls": json_schema_array(
                        json_schema_object(
                            json!({
                                "tool": json_schema_string("Name of the tool to call"),
                                "arguments": { "type": "object", "description": "Arguments for the call" }
                            }),
                            vec!["tool"],
                        ),
                        "Calls to make"
                    )
                }),
                vec!["tool_calls"],
            ),
        },
    ]
}

/// Run a bulk tool. Only a malformed envelope or a rejected batch is an
/// error here; individual call failures are part of the result.
pub async fn call_bulk(
    coordinator: &BatchCoordinator,
    name: &str,
    arguments: serde_json::Value,
) -> Result<CallToolResult, JsonRpcError> {
    let results = match name {
        CALL_TOOL_BULK => {
            let args: CallToolBulkArgs = serde_json::from_value(arguments).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid arguments for {}: {}", name, e))
            })?;
            coordinator
                .call_tool_bulk(&args.tool, args.tool_arguments)
                .await
        }
        CALL_TOOLS_BULK => {
            let args: CallToolsBulkArgs = serde_json::from_value(arguments).map_err(|e| {
                JsonRpcError::invalid_params(format!("Invalid arguments for {}: {}", name, e))
            })?;
            coordinator.call_tools_bulk(args.tool_calls).await
        }
        other => return Err(JsonRpcError::invalid_params(format!("Not a bulk tool: {}", other))),
    };

    let results = results.map_err(|e: BatchError| JsonRpcError::invalid_params(e.to_string()))?;
    render_results(&results)
}

/// Render call results as both text and structured content
pub fn render_results(results: &[CallResult]) -> Result<CallToolResult, JsonRpcError> {
    let text = serde_json::to_string_pretty(results)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to encode results: {}", e)))?;
    let structured = serde_json::to_value(results)
        .map_err(|e| JsonRpcError::internal_error(format!("Failed to encode results: {}", e)))?;

    let all_failed = !results.is_empty() && results.iter().all(|r| !r.is_ok());

    Ok(CallToolResult {
        content: vec![ToolContent::text(text)],
        structured_content: Some(json!({ "results": structured })),
        is_error: all_failed.then_some(true),
    })
}
