//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use rmcp::model::{CallToolResult, Content, ErrorData, JsonObject};
use serde_json::Value;

use crate::catalog::EndpointCatalog;
use crate::client::TokenBinding;
use crate::models::{BearerToken, DateRange, SearchInput, SearchResultEntry};

/// Name of the search tool
pub const SEARCH_TOOL_NAME: &str = "search-oura-data";

/// Errors from tool calls
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Authorization token required")]
    MissingToken,
}

impl From<ToolError> for ErrorData {
    fn from(err: ToolError) -> Self {
        ErrorData::invalid_params(err.to_string(), None)
    }
}

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search-oura-data")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Arc<JsonObject>,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

impl Tool {
    /// The listing advertised by `tools/list`
    pub fn definition(&self) -> rmcp::model::Tool {
        rmcp::model::Tool::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        )
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<CallToolResult, ToolError>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry holding the search tool
    pub fn new(catalog: Arc<EndpointCatalog>, binding: Arc<TokenBinding>) -> Self {
        let mut registry = Self::default();
        registry.register_search_tool(catalog, binding);
        registry
    }

    fn register_search_tool(&mut self, catalog: Arc<EndpointCatalog>, binding: Arc<TokenBinding>) {
        let mut required = vec!["query"];
        if binding.requires_caller_token() {
            required.insert(0, "token");
        }

        self.register(Tool {
            name: SEARCH_TOOL_NAME.to_string(),
            description: format!(
                "Search across {} Oura data endpoints by name and return their data",
                catalog.len()
            ),
            input_schema: Arc::new(rmcp::model::object(serde_json::json!({
                "type": "object",
                "properties": {
                    "token": {
                        "type": "string",
                        "description": "Oura personal access token"
                    },
                    "query": {
                        "type": "string",
                        "description": "Case-insensitive text matched against endpoint names (e.g. 'sleep')"
                    },
                    "start_date": {
                        "type": "string",
                        "description": "Start date (YYYY-MM-DD)"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End date (YYYY-MM-DD)"
                    }
                },
                "required": required
            }))),
            handler: Arc::new(SearchOuraDataHandler { catalog, binding }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, ordered by name
    pub fn all(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<CallToolResult, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        tool.handler.execute(args).await
    }
}

/// Handler for `search-oura-data`
#[derive(Debug)]
pub struct SearchOuraDataHandler {
    pub catalog: Arc<EndpointCatalog>,
    pub binding: Arc<TokenBinding>,
}

impl SearchOuraDataHandler {
    /// Fetch every endpoint whose display name contains `query`.
    ///
    /// Matched endpoints are fetched concurrently; failures are logged and
    /// left out, so the result keeps catalog order minus the failures.
    pub async fn search(
        &self,
        query: &str,
        dates: &DateRange,
        token: Option<BearerToken>,
    ) -> Result<Vec<SearchResultEntry>, ToolError> {
        let client = self.binding.client(token).ok_or(ToolError::MissingToken)?;
        let matches = self.catalog.search(query);
        tracing::debug!(%query, matches = matches.len(), "Searching Oura data");

        let fetches = matches.into_iter().map(|endpoint| {
            let client = &client;
            async move {
                let outcome = client.get(endpoint.upstream_path, dates).await;
                (endpoint, outcome)
            }
        });

        let results = join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(endpoint, outcome)| match outcome {
                Ok(response) => Some(SearchResultEntry {
                    name: endpoint.display_name.to_string(),
                    data: response.into_json(),
                }),
                Err(e) => {
                    tracing::warn!(endpoint = endpoint.name, error = %e, "Search fetch failed");
                    None
                }
            })
            .collect();

        Ok(results)
    }
}

#[async_trait::async_trait]
impl ToolHandler for SearchOuraDataHandler {
    async fn execute(&self, args: Value) -> Result<CallToolResult, ToolError> {
        let input: SearchInput = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let token = input.token.clone().and_then(BearerToken::new);
        let results = self.search(&input.query, &input.dates(), token).await?;

        let text = serde_json::to_string(&results)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}
