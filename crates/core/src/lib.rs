// Core dispatch engine for fsops: call model, tool registry, dispatcher and batch coordinator

pub mod batch;
pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod registry;
pub mod types;

pub use batch::{BatchConfig, BatchCoordinator};
pub use dispatcher::Dispatcher;
pub use error::{BatchError, ErrorKind, ToolError};
pub use registry::{RegisteredTool, Tool, ToolRegistry, ToolSchema};
pub use types::*;
