//! MCP (Model Context Protocol) server, built on rmcp.
//!
//! - [`resources`]: the resource handler over the endpoint catalog
//! - [`tools`]: the tool registry and `search-oura-data`
//! - [`server`]: the `ServerHandler` and the stdio transport
//! - [`http`]: the stateless HTTP transport

pub mod http;
pub mod resources;
pub mod server;
pub mod tools;

pub use resources::{ResourceError, ResourceHandler};
pub use server::{McpServer, ServerError};
pub use tools::{SearchOuraDataHandler, Tool, ToolError, ToolHandler, ToolRegistry};
