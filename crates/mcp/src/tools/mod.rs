// Filesystem tools and the bulk tool surface

pub mod bulk;
pub mod file;
pub mod folder;

pub use file::{
    FileAppendTool, FileCreateTool, FileDeleteTool, FileEraseTool, FileMoveTool, FileReadTool,
};
pub use folder::{
    FolderContentsTool, FolderCreateTool, FolderDeleteTool, FolderEmptyTool, FolderMoveTool,
};

use crate::config::ServerConfig;
use anyhow::{Context, Result};
use fsops_core::filter::PathFilter;
use fsops_core::{ToolError, ToolRegistry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;

/// Build the registry of file and folder tools, honoring the disabled lists
pub fn build_registry(config: &ServerConfig) -> Result<ToolRegistry> {
    let read_filter = Arc::new(
        PathFilter::excluding(&config.filters.read_exclusions)
            .context("Invalid read exclusion pattern")?,
    );
    let list_filter = Arc::new(
        PathFilter::excluding(&config.filters.list_exclusions)
            .context("Invalid list exclusion pattern")?,
    );

    let mut registry = ToolRegistry::with_disabled(config.disabled_tool_names());

    registry.register(Arc::new(FileReadTool::new(read_filter)))?;
    registry.register(Arc::new(FileCreateTool))?;
    registry.register(Arc::new(FileAppendTool))?;
    registry.register(Arc::new(FileEraseTool))?;
    registry.register(Arc::new(FileMoveTool))?;
    registry.register(Arc::new(FileDeleteTool))?;

    registry.register(Arc::new(FolderCreateTool))?;
    registry.register(Arc::new(FolderContentsTool::new(list_filter)))?;
    registry.register(Arc::new(FolderMoveTool))?;
    registry.register(Arc::new(FolderDeleteTool))?;
    registry.register(Arc::new(FolderEmptyTool))?;

    Ok(registry)
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathArgs {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveArgs {
    pub source: String,
    pub destination: String,
}

pub(crate) fn parse_args<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, ToolError> {
    Ok(serde_json::from_value(arguments)?)
}

pub(crate) fn path_property() -> serde_json::Value {
    fsops_core::registry::json_schema_string("Path of the target, absolute or relative to the server's working directory")
}

pub(crate) fn move_properties() -> serde_json::Value {
    serde_json::json!({
        "source": fsops_core::registry::json_schema_string("Current path"),
        "destination": fsops_core::registry::json_schema_string("New path; must not exist yet")
    })
}
