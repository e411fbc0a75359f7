//! MCP server: the rmcp `ServerHandler` over the catalog, plus the stdio
//! transport.
//!
//! [`McpServer`] is immutable once built and cheap to clone, so the HTTP
//! transport can hand a fresh copy to every request without locking.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorData, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParam, ReadResourceRequestParam,
    ReadResourceResult, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;

use crate::catalog::{EndpointCatalog, TokenMode};
use crate::client::{OuraApi, TokenBinding, UpstreamError};
use crate::config::{Config, ConfigError};

use super::resources::ResourceHandler;
use super::tools::{Tool, ToolRegistry};

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "Oura API";

/// Errors that stop the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MCP transport error: {0}")]
    Transport(String),
}

/// The MCP server for the Oura API
///
/// Serves the endpoint catalog as resources and the `search-oura-data` tool.
#[derive(Debug, Clone)]
pub struct McpServer {
    catalog: Arc<EndpointCatalog>,
    resources: ResourceHandler,
    tools: ToolRegistry,
}

impl McpServer {
    /// Build a server for `mode`. The binding decides where tokens come from.
    pub fn new(mode: TokenMode, binding: TokenBinding) -> Self {
        let catalog = Arc::new(EndpointCatalog::new(mode));
        let binding = Arc::new(binding);

        Self {
            resources: ResourceHandler::new(catalog.clone(), binding.clone()),
            tools: ToolRegistry::new(catalog.clone(), binding),
            catalog,
        }
    }

    /// Build a server from configuration, targeting the Oura API.
    ///
    /// Env token mode without a configured token is an error.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        Self::with_api(config, OuraApi::new()?)
    }

    /// Like [`McpServer::from_config`] with an explicit upstream factory
    pub fn with_api(config: &Config, api: OuraApi) -> Result<Self, ServerError> {
        let mode = config.api.token_mode;
        let binding = match mode {
            TokenMode::Env => TokenBinding::Process(api.client(config.require_token()?)),
            TokenMode::Path => TokenBinding::PerRequest(api),
        };

        Ok(Self::new(mode, binding))
    }

    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    pub fn resources(&self) -> &ResourceHandler {
        &self.resources
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the server in stdio mode (for Claude Desktop and other MCP clients)
    ///
    /// Serves newline-delimited JSON-RPC on stdin/stdout until stdin closes.
    pub async fn run_stdio(self) -> Result<(), ServerError> {
        tracing::info!(mode = ?self.catalog.mode(), "Starting MCP server in stdio mode");

        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| ServerError::Transport(e.to_string()))?;

        tracing::info!(?reason, "stdio transport closed, shutting down");
        Ok(())
    }

    /// Run the server in HTTP mode on `addr` until Ctrl-C
    pub async fn run_http(self, addr: &str) -> Result<(), ServerError> {
        super::http::serve(self, addr).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = crate::VERSION.to_string();

        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_resources()
                .enable_tools()
                .build(),
            server_info,
            instructions: Some(format!(
                "Oura Ring v2 data. Read the oura:// resources, or call {} to fetch every \
                 endpoint whose name matches a query.",
                super::tools::SEARCH_TOOL_NAME
            )),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        Ok(self.resources.list())
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, ErrorData> {
        Ok(self.resources.list_templates())
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        tracing::debug!(uri = %request.uri, "Reading resource");
        Ok(self.resources.read(&request.uri).await?)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools = self.tools.all().into_iter().map(Tool::definition).collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        tracing::debug!(tool = %request.name, "Calling tool");
        let args = Value::Object(request.arguments.unwrap_or_default());
        Ok(self.tools.execute(&request.name, args).await?)
    }
}
