// MCP (Model Context Protocol) server exposing filesystem tools and bulk tool calls

pub mod config;
pub mod protocol;
pub mod server;
pub mod tools;

pub use config::ServerConfig;
pub use server::McpServer;
