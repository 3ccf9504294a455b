// Standalone MCP server binary

use anyhow::Result;
use clap::Parser;
use fsops_mcp::config::ServerConfig;
use fsops_mcp::server::McpServer;
use fsops_mcp::tools::build_registry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fsops-mcp")]
#[command(about = "MCP server for file and folder operations with bulk tool calls", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "fsops.toml")]
    config: PathBuf,

    /// File tools to disable, e.g. "delete,move"
    #[arg(long, env = "DISABLED_FILE_TOOLS", value_delimiter = ',')]
    disabled_file_tools: Vec<String>,

    /// Folder tools to disable, e.g. "delete,empty"
    #[arg(long, env = "DISABLED_FOLDER_TOOLS", value_delimiter = ',')]
    disabled_folder_tools: Vec<String>,

    /// Maximum number of calls of one bulk request running at once
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Maximum number of calls accepted in one bulk request
    #[arg(long)]
    max_batch_size: Option<usize>,

    /// Deadline for a whole bulk request, in seconds
    #[arg(long)]
    batch_timeout_secs: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut ServerConfig) {
        config
            .tools
            .disabled_file_tools
            .extend(self.disabled_file_tools.into_iter().filter(|t| !t.trim().is_empty()));
        config
            .tools
            .disabled_folder_tools
            .extend(self.disabled_folder_tools.into_iter().filter(|t| !t.trim().is_empty()));

        if let Some(max_concurrency) = self.max_concurrency {
            config.bulk.max_concurrency = max_concurrency;
        }
        if let Some(max_batch_size) = self.max_batch_size {
            config.bulk.max_batch_size = max_batch_size;
        }
        if let Some(timeout_secs) = self.batch_timeout_secs {
            config.bulk.timeout_secs = Some(timeout_secs);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fsops_core=info,fsops_mcp=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("fsops MCP server starting...");

    let mut config = ServerConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let registry = build_registry(&config)?;
    tracing::info!(
        "Registered {} tools (bulk concurrency {}, max batch size {})",
        registry.len(),
        config.bulk.max_concurrency,
        config.bulk.max_batch_size
    );

    let server = McpServer::new(registry, config.bulk);
    server.start().await?;

    Ok(())
}
