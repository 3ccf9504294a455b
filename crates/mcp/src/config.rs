// Server configuration loaded from TOML

use anyhow::{Context, Result};
use fsops_core::filter::default_skip_read;
use fsops_core::BatchConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tools::bulk::is_bulk_tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub bulk: BatchConfig,

    #[serde(default)]
    pub filters: FilterConfig,
}

/// Tools to leave out, by short name ("delete") or full name ("file_delete")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub disabled_file_tools: Vec<String>,

    #[serde(default)]
    pub disabled_folder_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_skip_read")]
    pub read_exclusions: Vec<String>,

    #[serde(default)]
    pub list_exclusions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            read_exclusions: default_skip_read(),
            list_exclusions: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        // Load config file if it exists, otherwise use defaults
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .context("Failed to read configuration file")?;
            Self::from_toml(&content)
        } else {
            tracing::info!(
                "Configuration file {} not found, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bulk.validate().context("Invalid [bulk] configuration")
    }

    /// Full names of every disabled tool
    pub fn disabled_tool_names(&self) -> Vec<String> {
        let file = self
            .tools
            .disabled_file_tools
            .iter()
            .map(|name| qualify("file", name));
        let folder = self
            .tools
            .disabled_folder_tools
            .iter()
            .map(|name| qualify("folder", name));

        file.chain(folder)
            .filter(|name| {
                if is_bulk_tool(name) {
                    tracing::warn!(tool = %name, "Bulk tools cannot be disabled, ignoring");
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

/// Accepts plain names as well as fragments of a JSON list such as `["delete"`
fn qualify(namespace: &str, name: &str) -> String {
    let name = name.trim_matches(|c: char| c == '[' || c == ']' || c == '"' || c.is_whitespace());
    if is_bulk_tool(name) || name.starts_with(&format!("{}_", namespace)) {
        name.to_string()
    } else {
        format!("{}_{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsops_core::filter::DEFAULT_SKIP_READ;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();

        assert!(config.tools.disabled_file_tools.is_empty());
        assert!(config.tools.disabled_folder_tools.is_empty());
        assert_eq!(config.bulk, BatchConfig::default());
        assert_eq!(config.filters.read_exclusions.len(), DEFAULT_SKIP_READ.len());
        assert!(config.filters.read_exclusions.contains(&"**/.git/**".to_string()));
        assert!(config.filters.list_exclusions.is_empty());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServerConfig::load(&dir.path().join("fsops.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn test_load_custom_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fsops.toml");
        std::fs::write(
            &path,
            r#"
[tools]
disabled_file_tools = ["delete", "file_move"]
disabled_folder_tools = ["empty"]

[bulk]
max_concurrency = 8
timeout_secs = 30

[filters]
read_exclusions = ["*.log", "*.tmp"]
"#,
        )
        .unwrap();

        let config = ServerConfig::load(&path).unwrap();

        assert_eq!(config.bulk.max_concurrency, 8);
        assert_eq!(config.bulk.max_batch_size, 1000);
        assert_eq!(config.bulk.timeout_secs, Some(30));
        assert_eq!(config.filters.read_exclusions, vec!["*.log", "*.tmp"]);
        assert_eq!(
            config.disabled_tool_names(),
            vec!["file_delete", "file_move", "folder_empty"]
        );
    }

    #[test]
    fn test_bulk_tools_cannot_be_disabled() {
        let mut config = ServerConfig::default();
        config.tools.disabled_file_tools = vec!["call_tool_bulk".to_string(), "read".to_string()];
        config.tools.disabled_folder_tools = vec!["call_tools_bulk".to_string()];

        assert_eq!(config.disabled_tool_names(), vec!["file_read"]);
    }

    #[test]
    fn test_json_list_fragments() {
        let mut config = ServerConfig::default();
        config.tools.disabled_file_tools = vec!["[\"delete\"".to_string(), "\"copy\"]".to_string()];

        assert_eq!(config.disabled_tool_names(), vec!["file_delete", "file_copy"]);
    }

    #[test]
    fn test_out_of_range_bulk_values() {
        let err = ServerConfig::from_toml("[bulk]\ntimeout_secs = 9223372036854775807").unwrap_err();
        assert!(format!("{:#}", err).contains("timeout_secs"));

        let mut config = ServerConfig::default();
        config.bulk.max_concurrency = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ServerConfig::from_toml("[bulk]\nmax_concurrency = \"many\"").is_err());
    }
}
