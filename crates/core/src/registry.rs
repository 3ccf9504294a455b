// Tool registry: name -> handler plus its compiled input schema

use crate::error::ToolError;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Tool definition as advertised to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Tool handler trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema
    fn schema(&self) -> ToolSchema;

    /// Invoke the tool with already-validated arguments
    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;
}

/// A registered tool together with its compiled argument validator
#[derive(Clone)]
pub struct RegisteredTool {
    pub schema: ToolSchema,
    pub handler: Arc<dyn Tool>,
    validator: Arc<jsonschema::Validator>,
}

impl RegisteredTool {
    /// Validate arguments against the tool's input schema.
    /// Returns the joined diagnostics on failure.
    pub fn validate(&self, arguments: &serde_json::Value) -> std::result::Result<(), String> {
        let errors: Vec<String> = self
            .validator
            .iter_errors(arguments)
            .map(|e| {
                let location = e.instance_path.to_string();
                if location.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", location, e)
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}

/// Registry of available tools. Read-only once shared.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    disabled: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools whose names appear here are skipped at registration and
    /// therefore resolve exactly like unknown tools.
    pub fn with_disabled<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: HashMap::new(),
            disabled: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Register a tool. Returns `false` if the tool is disabled.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<bool> {
        let schema = tool.schema();

        if self.disabled.contains(&schema.name) {
            tracing::info!(tool = %schema.name, "Tool disabled, not registering");
            return Ok(false);
        }

        let validator = jsonschema::validator_for(&schema.input_schema)
            .map_err(|e| anyhow!("Invalid input schema for tool {}: {}", schema.name, e))?;

        if self.tools.contains_key(&schema.name) {
            tracing::warn!(tool = %schema.name, "Replacing previously registered tool");
        }

        self.tools.insert(
            schema.name.clone(),
            RegisteredTool {
                schema,
                handler: tool,
                validator: Arc::new(validator),
            },
        );
        Ok(true)
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Option<RegisteredTool> {
        self.tools.get(name).cloned()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tool schemas, sorted by name
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema.clone()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

pub fn json_schema_array(items: serde_json::Value, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "array",
        "items": items,
        "description": description
    })
}
