// Call model: descriptors and per-call results

use crate::error::{ErrorKind, ToolError};
use serde::{Deserialize, Serialize};

/// One requested invocation within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    #[serde(alias = "tool", alias = "name")]
    pub tool_name: String,
    #[serde(default = "empty_arguments")]
    pub arguments: serde_json::Value,
}

fn empty_arguments() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl CallDescriptor {
    pub fn new(tool_name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }
}

/// Structured error carried by a failed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<ToolError> for CallError {
    fn from(err: ToolError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Ok { value: serde_json::Value },
    Error { error: CallError },
}

/// Outcome of one call, tagged with its position in the originating batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub index: usize,
    pub tool: String,
    #[serde(flatten)]
    pub outcome: CallOutcome,
}

impl CallResult {
    pub fn ok(index: usize, tool: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            index,
            tool: tool.into(),
            outcome: CallOutcome::Ok { value },
        }
    }

    pub fn error(index: usize, tool: impl Into<String>, error: CallError) -> Self {
        Self {
            index,
            tool: tool.into(),
            outcome: CallOutcome::Error { error },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, CallOutcome::Ok { .. })
    }

    pub fn value(&self) -> Option<&serde_json::Value> {
        match &self.outcome {
            CallOutcome::Ok { value } => Some(value),
            CallOutcome::Error { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            CallOutcome::Ok { .. } => None,
            CallOutcome::Error { error } => Some(error.kind),
        }
    }
}
