//! Router assembly shared by the binary and the integration tests.

use crate::config::Cli;
use crate::rest::{self, RestState};
use crate::{mcp, openapi};
use axum::Router;
use jgrants_core::JgrantsClient;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Preflight responses may be cached by browsers for this long.
const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

/// Build the HTTP application for the surfaces selected in `cli`.
///
/// `/ping` is always served. `cancel` ends open MCP sessions on shutdown.
pub fn build(cli: &Cli, client: JgrantsClient, cancel: &CancellationToken) -> Router {
    let mut app = rest::health_router();

    if cli.surface.rest() {
        let state = Arc::new(RestState {
            client: client.clone(),
            openapi: openapi::document(&cli.public_server()),
        });
        app = app.merge(rest::router(state));
    }

    if cli.surface.mcp() {
        app = app.nest_service("/mcp", mcp::service(client, cancel));
    }

    app.fallback(rest::fallback)
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
        .max_age(CORS_MAX_AGE)
}
