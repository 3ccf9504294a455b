// Folder tools: create, contents, move, delete, empty

use crate::tools::file::rename;
use crate::tools::{move_properties, parse_args, path_property, MoveArgs, PathArgs};
use fsops_core::filter::PathFilter;
use fsops_core::registry::{json_schema_boolean, json_schema_object, Tool, ToolSchema};
use fsops_core::ToolError;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

fn path_schema() -> serde_json::Value {
    json_schema_object(json!({ "path": path_property() }), vec!["path"])
}

async fn ensure_folder(path: &str) -> Result<(), ToolError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| ToolError::from_io(e, path))?;
    if metadata.is_dir() {
        Ok(())
    } else {
        Err(ToolError::InvalidArguments(format!("{} is not a folder", path)))
    }
}

/// Tool to create a folder, including missing parents
pub struct FolderCreateTool;

#[async_trait::async_trait]
impl Tool for FolderCreateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "folder_create".to_string(),
            description: "Create a folder and any missing parent folders. Fails if the path already exists".to_string(),
            input_schema: path_schema(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: PathArgs = parse_args(arguments)?;

        let exists = tokio::fs::try_exists(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;
        if exists {
            return Err(ToolError::AlreadyExists(args.path));
        }

        tokio::fs::create_dir_all(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;

        tracing::debug!(path = %args.path, "Folder created");
        Ok(json!({ "path": args.path, "created": true }))
    }
}

/// Tool to list the entries of a folder
pub struct FolderContentsTool {
    exclusions: Arc<PathFilter>,
}

impl FolderContentsTool {
    pub fn new(exclusions: Arc<PathFilter>) -> Self {
        Self { exclusions }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsArgs {
    path: String,
    #[serde(default)]
    recursive: bool,
}

/// Directories are hidden when the filter would hide their contents.
fn is_visible(filter: &PathFilter, path: &Path, is_dir: bool) -> bool {
    filter.matches(path) && (!is_dir || filter.matches(path.join("_")))
}

fn list_entries(
    root: PathBuf,
    recursive: bool,
    filter: &PathFilter,
) -> Result<Vec<String>, ToolError> {
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| is_visible(filter, entry.path(), entry.file_type().is_dir()));

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root.as_path()).to_path_buf();
            match e.into_io_error() {
                Some(io) => ToolError::from_io(io, &path),
                None => ToolError::Internal(format!("Filesystem loop at {}", path.display())),
            }
        })?;

        let relative = entry
            .path()
            .strip_prefix(&root)
            .map_err(|e| ToolError::Internal(e.to_string()))?;
        let mut name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if entry.file_type().is_dir() {
            name.push('/');
        }
        entries.push(name);
    }

    entries.sort();
    Ok(entries)
}

#[async_trait::async_trait]
impl Tool for FolderContentsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "folder_contents".to_string(),
            description: "List the entries of a folder, sorted by name. Folders end with '/'".to_string(),
            input_schema: json_schema_object(
                json!({
                    "path": path_property(),
                    "recursive": json_schema_boolean("Include entries of subfolders (default: false)")
                }),
                vec!["path"],
            ),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ContentsArgs = parse_args(arguments)?;
        ensure_folder(&args.path).await?;

        let filter = self.exclusions.clone();
        let root = PathBuf::from(&args.path);
        let recursive = args.recursive;
        let entries = tokio::task::spawn_blocking(move || list_entries(root, recursive, &filter))
            .await
            .map_err(|e| ToolError::Internal(format!("Listing task failed: {}", e)))??;

        tracing::debug!(path = %args.path, count = entries.len(), "Folder listed");
        Ok(json!(entries))
    }
}

/// Tool to move or rename a folder
pub struct FolderMoveTool;

#[async_trait::async_trait]
impl Tool for FolderMoveTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "folder_move".to_string(),
            description: "Move a folder to a new path. Fails if the destination exists".to_string(),
            input_schema: json_schema_object(move_properties(), vec!["source", "destination"]),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: MoveArgs = parse_args(arguments)?;
        ensure_folder(&args.source).await?;

        rename(&args.source, &args.destination).await?;

        tracing::debug!(source = %args.source, destination = %args.destination, "Folder moved");
        Ok(json!({ "source": args.source, "destination": args.destination, "moved": true }))
    }
}

#[derive(Debug, Deserialize)]
struct DeleteArgs {
    path: String,
    #[serde(default)]
    recursive: bool,
}

/// Tool to delete a folder
pub struct FolderDeleteTool;

#[async_trait::async_trait]
impl Tool for FolderDeleteTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "folder_delete".to_string(),
            description: "Delete a folder. A non-empty folder is only deleted when recursive is true".to_string(),
            input_schema: json_schema_object(
                json!({
                    "path": path_property(),
                    "recursive": json_schema_boolean("Delete the folder and everything in it (default: false)")
                }),
                vec!["path"],
            ),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: DeleteArgs = parse_args(arguments)?;
        ensure_folder(&args.path).await?;

        if args.recursive {
            tokio::fs::remove_dir_all(&args.path)
                .await
                .map_err(|e| ToolError::from_io(e, &args.path))?;
        } else {
            let mut dir = tokio::fs::read_dir(&args.path)
                .await
                .map_err(|e| ToolError::from_io(e, &args.path))?;
            let has_entries = dir
                .next_entry()
                .await
                .map_err(|e| ToolError::from_io(e, &args.path))?
                .is_some();
            if has_entries {
                return Err(ToolError::NotEmpty(args.path));
            }

            tokio::fs::remove_dir(&args.path)
                .await
                .map_err(|e| ToolError::from_io(e, &args.path))?;
        }

        tracing::debug!(path = %args.path, recursive = args.recursive, "Folder deleted");
        Ok(json!({ "path": args.path, "deleted": true }))
    }
}

/// Tool to remove everything inside a folder, keeping the folder
pub struct FolderEmptyTool;

#[async_trait::async_trait]
impl Tool for FolderEmptyTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "folder_empty".to_string(),
            description: "Remove all files and subfolders inside a folder, keeping the folder itself".to_string(),
            input_schema: path_schema(),
        }
    }

    async fn invoke(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: PathArgs = parse_args(arguments)?;
        ensure_folder(&args.path).await?;

        let mut dir = tokio::fs::read_dir(&args.path)
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?;

        let mut removed = 0usize;
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ToolError::from_io(e, &args.path))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| ToolError::from_io(e, &path))?;

            let result = if file_type.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            result.map_err(|e| ToolError::from_io(e, &path))?;
            removed += 1;
        }

        tracing::debug!(path = %args.path, removed, "Folder emptied");
        Ok(json!({ "path": args.path, "emptied": true, "removed": removed }))
    }
}
