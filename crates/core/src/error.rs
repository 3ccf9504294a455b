// Error taxonomy for tool dispatch

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// Kind of a failed call, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArguments,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    NotEmpty,
    InternalError,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownTool => "unknown_tool",
            Self::InvalidArguments => "invalid_arguments",
            Self::NotFound => "not_found",
            Self::AlreadyExists => "already_exists",
            Self::PermissionDenied => "permission_denied",
            Self::NotEmpty => "not_empty",
            Self::InternalError => "internal_error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a tool handler.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Folder not empty: {0}")]
    NotEmpty(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::NotEmpty(_) => ErrorKind::NotEmpty,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Map an I/O failure on `path` onto the taxonomy.
    pub fn from_io(err: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().display();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_string()),
            io::ErrorKind::AlreadyExists => Self::AlreadyExists(path.to_string()),
            io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(format!("{} ({})", path, err))
            }
            io::ErrorKind::DirectoryNotEmpty => Self::NotEmpty(path.to_string()),
            _ => Self::Internal(format!("{}: {}", path, err)),
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

/// Batch-level failure. Individual call failures never produce one of these.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Batch of {len} calls exceeds the limit of {max}")]
    TooLarge { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mapping() {
        let cases = [
            (io::ErrorKind::NotFound, ErrorKind::NotFound),
            (io::ErrorKind::AlreadyExists, ErrorKind::AlreadyExists),
            (io::ErrorKind::PermissionDenied, ErrorKind::PermissionDenied),
            (io::ErrorKind::DirectoryNotEmpty, ErrorKind::NotEmpty),
            (io::ErrorKind::Other, ErrorKind::InternalError),
        ];

        for (io_kind, expected) in cases {
            let err = ToolError::from_io(io::Error::from(io_kind), "/tmp/a.txt");
            assert_eq!(err.kind(), expected, "io kind {:?}", io_kind);
        }
    }

    #[test]
    fn test_message_names_path() {
        let err = ToolError::from_io(io::Error::from(io::ErrorKind::NotFound), "/data/x.txt");
        assert_eq!(err.to_string(), "Not found: /data/x.txt");

        let err = ToolError::from_io(io::Error::other("disk on fire"), "/data/x.txt");
        assert!(err.to_string().contains("disk on fire"));
        assert!(err.to_string().contains("/data/x.txt"));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_value(ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, serde_json::json!("permission_denied"));
        assert_eq!(ErrorKind::UnknownTool.to_string(), "unknown_tool");
    }
}
