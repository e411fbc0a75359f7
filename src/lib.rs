//! # Oura MCP
//!
//! A Model Context Protocol (MCP) server that republishes the Oura Ring v2
//! REST API as addressable resources and a search tool.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (EndpointDescriptor, DateRange, etc.)
//! - [`catalog`]: The fixed endpoint catalog, URI templates and token modes
//! - [`client`]: Upstream HTTP client bound to a bearer token
//! - [`mcp`]: MCP resources, tools and transports (rmcp)
//! - [`config`]: Configuration management

pub mod catalog;
pub mod client;
pub mod config;
pub mod mcp;
pub mod models;

// Re-export commonly used types
pub use catalog::{EndpointCatalog, TokenMode};
pub use client::{OuraApi, OuraClient, TokenBinding};
pub use mcp::McpServer;
pub use models::{BearerToken, DateRange, EndpointDescriptor};

/// Library version, reported in `serverInfo`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
