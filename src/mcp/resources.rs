//! Resource handler: one generic reader for every catalog entry.

use std::sync::Arc;

use rmcp::model::{
    Annotated, ErrorData, ListResourceTemplatesResult, ListResourcesResult, RawResource,
    RawResourceTemplate, ReadResourceResult, ResourceContents,
};

use crate::catalog::{CatalogError, EndpointCatalog};
use crate::client::{TokenBinding, UpstreamError};
use crate::models::EndpointDescriptor;

/// MIME type of every resource body
pub const JSON_MIME_TYPE: &str = "application/json";

/// Errors from reading a resource
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The upstream call failed; the status is not translated further
    #[error("Failed to fetch {name}: {source}")]
    Upstream {
        name: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl From<ResourceError> for ErrorData {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Catalog(CatalogError::UnknownResource(uri)) => ErrorData::resource_not_found(
                "Resource not found",
                Some(serde_json::json!({ "uri": uri })),
            ),
            ResourceError::Catalog(other) => ErrorData::invalid_params(other.to_string(), None),
            ResourceError::Upstream { name, .. } => {
                ErrorData::internal_error(format!("Failed to fetch {}", name), None)
            }
        }
    }
}

/// Serves `resources/list`, `resources/templates/list` and `resources/read`
#[derive(Debug, Clone)]
pub struct ResourceHandler {
    catalog: Arc<EndpointCatalog>,
    binding: Arc<TokenBinding>,
}

impl ResourceHandler {
    pub fn new(catalog: Arc<EndpointCatalog>, binding: Arc<TokenBinding>) -> Self {
        Self { catalog, binding }
    }

    /// Resources addressable by a constant URI
    pub fn list(&self) -> ListResourcesResult {
        let resources = self
            .catalog
            .fixed()
            .into_iter()
            .map(|e| {
                let mut raw = RawResource::new(e.uri_template.clone(), e.name);
                raw.description = Some(e.description.to_string());
                raw.mime_type = Some(JSON_MIME_TYPE.to_string());
                Annotated::new(raw, None)
            })
            .collect();

        ListResourcesResult::with_all_items(resources)
    }

    /// Resources that need template variables
    pub fn list_templates(&self) -> ListResourceTemplatesResult {
        let templates = self
            .catalog
            .templated()
            .into_iter()
            .map(|e| Annotated::new(template_for(e), None))
            .collect();

        ListResourceTemplatesResult::with_all_items(templates)
    }

    /// Resolve `uri`, fetch it upstream and wrap the body verbatim.
    ///
    /// A missing token fails here without touching the network.
    pub async fn read(&self, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let request = self.catalog.resolve(uri)?;
        let endpoint = request.endpoint;

        let client = self
            .binding
            .client(request.token)
            .ok_or(CatalogError::MissingToken)?;

        let response = client
            .get(endpoint.upstream_path, &request.dates)
            .await
            .map_err(|source| {
                tracing::error!(endpoint = endpoint.name, error = %source, "Error fetching resource");
                ResourceError::Upstream {
                    name: endpoint.name,
                    source,
                }
            })?;

        tracing::debug!(endpoint = endpoint.name, "Resource read");

        let mut contents = ResourceContents::text(response.into_text(), request.uri);
        if let ResourceContents::TextResourceContents { mime_type, .. } = &mut contents {
            *mime_type = Some(JSON_MIME_TYPE.to_string());
        }

        Ok(ReadResourceResult {
            contents: vec![contents],
        })
    }
}

fn template_for(endpoint: &EndpointDescriptor) -> RawResourceTemplate {
    RawResourceTemplate {
        uri_template: endpoint.uri_template.clone(),
        name: endpoint.name.to_string(),
        title: Some(endpoint.display_name.to_string()),
        description: Some(endpoint.description.to_string()),
        mime_type: Some(JSON_MIME_TYPE.to_string()),
    }
}
