// File tools: read, create, append, erase, move, delete

use crate::tools::{move_properties, parse_args, path_property, ContentArgs, MoveArgs, PathArgs};
use fsops_core::filter::PathFilter;
use fsops_core::registry::{json_schema_object, json_schema_string, Tool, ToolSchema};
use fsops_core::ToolError;
use serde_json::json;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

fn content_schema(verb: &str) -> serde_json::Value {
    json_schema_object(
        json!({
            "path": path_property(),
            "content": json_schema_string(&format!("Text to {}", verb))
        }),
        vec!["path", "content"],
    )
}

fn path_schema() -> serde_json::Value {
    json_schema_object(json!({ "path": path_property() }), vec!["path"])
}

async fn write_all(mut file: tokio::fs::File, path: &str, content: &str) -> Result<(), ToolError> {
    file.write_all(content.as_bytes())
        .await
        .map_err(|e| ToolError::from_io(e, path))?;
    file.flush().await.map_err(|e| ToolError::from_io(e, path))
}

/// Fails with `invalid_arguments` when `path` is a folder
async fn ensure_not_folder(path: &str, folder_tool: &str) -> Result<(), ToolError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ToolError::from_io(e, path))?;
    if metadata.is_dir() {
        return Err(ToolError::InvalidArguments(format!(
            "{} is a folder, use {}",
            path, folder_tool
        )));
    }
    Ok(())
}

/// Tool to read a text file
pub struct FileReadTool {
    exclusions: Arc<PathFilter>,
}

impl FileReadTool {
    pub fn new(exclusions: Arc<PathFilter>) -> Self {
        Self { exclusions }
    }
}

#[async_trait::async_trait]
impl Tool for FileReadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_read".to_string(),
            description: "Read the content of a UTF-8 text file".to_string(),
            input_schema: path_schema(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: PathArgs = parse_args(arguments)?;

        if !self.exclusions.matches(&args.path) {
            return Err(ToolError::PermissionDenied(format!(
                "{} is excluded from reading",
                args.path
            )));
        }
        ensure_not_folder(&args.path, "folder_contents").await?;

        let content = tokio::fs::read_to_string(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;

        tracing::debug!(path = %args.path, bytes = content.len(), "File read");
        Ok(json!(content))
    }
}

/// Tool to create a new file with content
pub struct FileCreateTool;

#[async_trait::async_trait]
impl Tool for FileCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_create".to_string(),
            description: "Create a new file with the given content. Fails if the file already exists".to_string(),
            input_schema: content_schema("write"),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ContentArgs = parse_args(arguments)?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;
        write_all(file, &args.path, &args.content).await?;

        tracing::debug!(path = %args.path, "File created");
        Ok(json!({ "path": args.path, "created": true }))
    }
}

/// Tool to append content to an existing file
pub struct FileAppendTool;

#[async_trait::async_trait]
impl Tool for FileAppendTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_append".to_string(),
            description: "Append content to the end of an existing file".to_string(),
            input_schema: content_schema("append"),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ContentArgs = parse_args(arguments)?;

        let file = OpenOptions::new()
            .append(true)
            .open(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;
        write_all(file, &args.path, &args.content).await?;

        tracing::debug!(path = %args.path, bytes = args.content.len(), "Content appended");
        Ok(json!({ "path": args.path, "appended": true }))
    }
}

/// Tool to truncate an existing file to zero length
pub struct FileEraseTool;

#[async_trait::async_trait]
impl Tool for FileEraseTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_erase".to_string(),
            description: "Erase the content of an existing file, keeping the file".to_string(),
            input_schema: path_schema(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: PathArgs = parse_args(arguments)?;

        OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;

        tracing::debug!(path = %args.path, "File erased");
        Ok(json!({ "path": args.path, "erased": true }))
    }
}

/// Tool to move or rename a file
pub struct FileMoveTool;

#[async_trait::async_trait]
impl Tool for FileMoveTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_move".to_string(),
            description: "Move a file to a new path. Fails if the destination exists".to_string(),
            input_schema: json_schema_object(move_properties(), vec!["source", "destination"]),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: MoveArgs = parse_args(arguments)?;
        ensure_not_folder(&args.source, "folder_move").await?;

        rename(&args.source, &args.destination).await?;

        tracing::debug!(source = %args.source, destination = %args.destination, "File moved");
        Ok(json!({ "source": args.source, "destination": args.destination, "moved": true }))
    }
}

/// Rename `source` to `destination`, refusing to overwrite
pub(crate) async fn rename(source: &str, destination: &str) -> Result<(), ToolError> {
    let exists = tokio::fs::try_exists(destination)
        .await
        .map_err(|e| ToolError::from_io(e, destination))?;
    if exists {
        return Err(ToolError::AlreadyExists(destination.to_string()));
    }

    if let Err(e) = tokio::fs::rename(source, destination).await {
        let source_exists = tokio::fs::try_exists(source).await.unwrap_or(false);
        return Err(if source_exists {
            ToolError::from_io(e, destination)
        } else {
            ToolError::from_io(e, source)
        });
    }
    Ok(())
}

/// Tool to delete a file
pub struct FileDeleteTool;

#[async_trait::async_trait]
impl Tool for FileDeleteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "file_delete".to_string(),
            description: "Delete a file".to_string(),
            input_schema: path_schema(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: PathArgs = parse_args(arguments)?;
        ensure_not_folder(&args.path, "folder_delete").await?;

        tokio::fs::remove_file(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;

        tracing::debug!(path = %args.path, "File deleted");
        Ok(json!({ "path": args.path, "deleted": true }))
    }
}
