// Single-call dispatch: resolve, validate, invoke, normalize

use crate::error::ErrorKind;
use crate::registry::ToolRegistry;
use crate::types::{CallDescriptor, CallError, CallResult};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

/// Executes one call descriptor and always produces exactly one call result.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    /// Dispatch a call. Every failure, including a handler panic, is
    /// returned as an error result.
    pub async fn dispatch(&self, index: usize, call: CallDescriptor) -> CallResult {
        let span = tracing::debug_span!("dispatch", tool = %call.tool_name, index);
        let result = self.dispatch_inner(index, call).instrument(span).await;

        match result.error_kind() {
            None => tracing::debug!(tool = %result.tool, index, "Call succeeded"),
            Some(kind) => tracing::warn!(tool = %result.tool, index, kind = %kind, "Call failed"),
        }

        result
    }

    async fn dispatch_inner(&self, index: usize, call: CallDescriptor) -> CallResult {
        let CallDescriptor {
            tool_name,
            arguments,
        } = call;

        let Some(tool) = self.registry.resolve(&tool_name) else {
            return CallResult::error(
                index,
                tool_name.clone(),
                CallError::new(ErrorKind::UnknownTool, format!("Unknown tool: {}", tool_name)),
            );
        };

        if let Err(diagnostic) = tool.validate(&arguments) {
            return CallResult::error(
                index,
                tool_name.clone(),
                CallError::new(
                    ErrorKind::InvalidArguments,
                    format!("Invalid arguments for {}: {}", tool_name, diagnostic),
                ),
            );
        }

        let invocation = AssertUnwindSafe(tool.handler.invoke(arguments)).catch_unwind();
        match invocation.await {
            Ok(Ok(value)) => CallResult::ok(index, tool_name, value),
            Ok(Err(err)) => CallResult::error(index, tool_name, err.into()),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(tool = %tool_name, index, "Tool handler panicked: {}", message);
                CallResult::error(
                    index,
                    tool_name,
                    CallError::new(
                        ErrorKind::InternalError,
                        format!("Tool handler panicked: {}", message),
                    ),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
