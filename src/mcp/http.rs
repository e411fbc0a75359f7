//! Streamable HTTP transport, stateless.
//!
//! `POST /mcp` is served by rmcp's `StreamableHttpService` with sessions
//! turned off: every POST gets a fresh copy of the server and its own task,
//! and no session id is issued. `GET` and `DELETE` on `/mcp` are rejected
//! with 405. A panic while handling a request becomes a 500 for that request
//! only.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post_service,
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde_json::Value;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::server::{McpServer, ServerError};

/// Path the MCP endpoint is mounted on
pub const MCP_PATH: &str = "/mcp";

/// Build the axum router for `server`
pub fn router(server: McpServer) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    with_transport_layers(Router::new().route(
        MCP_PATH,
        post_service(service)
            .get(method_not_allowed)
            .delete(method_not_allowed),
    ))
}

/// Panic handling and request tracing shared by every MCP route
fn with_transport_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(internal_error_response))
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(server: McpServer, addr: &str) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        mode = ?server.catalog().mode(),
        "MCP HTTP transport listening on {}{}",
        addr,
        MCP_PATH
    );

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, -32000, "Method not allowed.")
}

fn internal_error_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Error handling MCP request");

    error_response(StatusCode::INTERNAL_SERVER_ERROR, -32603, "Internal server error")
}

/// A JSON-RPC error that answers no particular request
fn error_response(status: StatusCode, code: i32, message: &str) -> Response {
    let body: Value = serde_json::json!({
        "jsonrpc": "2.0",
        "error": { "code": code, "message": message },
        "id": null
    });
    (status, Json(body)).into_response()
}
