//! REST surface (GPT Actions).
//!
//! Handlers validate, delegate to [`JgrantsClient`] and map failures onto `{"detail": ...}`
//! responses:
//! - validation problems → 400
//! - unknown subsidy → 404
//! - upstream or unexpected failures → 500 (logged with full context)

use crate::error::ApiError;
use crate::openapi::SERVICE_TITLE;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Extension, Json, Router};
use jgrants_core::{JgrantsClient, OverviewFormat, SearchParams};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, info};

pub struct RestState {
    pub client: JgrantsClient,
    /// Pre-rendered `/openapi.json`.
    pub openapi: Value,
}

pub fn router(state: Arc<RestState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/subsidies/search", get(search_subsidies))
        .route("/subsidies/overview", get(subsidy_overview))
        .route("/subsidies/{subsidy_id}", get(subsidy_detail))
        .route(
            "/subsidies/{subsidy_id}/files/{filename}",
            get(file_content),
        )
        .route("/openapi.json", get(openapi_document))
        .layer(Extension(state))
}

/// Routes served regardless of which surfaces are enabled.
pub fn health_router() -> Router {
    Router::new().route("/ping", get(ping))
}

pub async fn fallback() -> ApiError {
    ApiError::not_found("Not Found")
}

async fn root() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_TITLE,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok", "message": "pong" }))
}

async fn openapi_document(Extension(state): Extension<Arc<RestState>>) -> Json<Value> {
    Json(state.openapi.clone())
}

async fn search_subsidies(
    Extension(state): Extension<Arc<RestState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let query = params.validate()?;

    match state.client.search(&query).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            error!(error = ?e, keyword = %query.keyword(), "search failed");
            Err(ApiError::internal(format!("search failed: {e}")))
        }
    }
}

async fn subsidy_detail(
    Extension(state): Extension<Arc<RestState>>,
    Path(subsidy_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let subsidy_id = subsidy_id.trim();
    if subsidy_id.is_empty() {
        return Err(ApiError::bad_request("subsidy_id must be a non-empty string"));
    }

    match state.client.subsidy_detail(subsidy_id).await {
        Ok(record) => Ok(Json(record)),
        Err(e) if e.is_not_found() => Err(ApiError::not_found(format!(
            "subsidy '{subsidy_id}' not found"
        ))),
        Err(e) => {
            error!(error = ?e, subsidy_id = %subsidy_id, "detail lookup failed");
            Err(ApiError::internal(e.to_string()))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OverviewParams {
    #[serde(default)]
    output_format: Option<String>,
}

async fn subsidy_overview(
    Extension(state): Extension<Arc<RestState>>,
    params: Result<Query<OverviewParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let format: OverviewFormat = params.output_format.as_deref().unwrap_or("json").parse()?;
    info!(output_format = ?format, "overview requested");

    let overview = state.client.overview(format).await.map_err(|e| {
        error!(error = ?e, "overview failed");
        ApiError::internal(format!("overview failed: {e}"))
    })?;
    serde_json::to_value(overview)
        .map(Json)
        .map_err(|e| ApiError::internal(format!("overview serialization failed: {e}")))
}

#[derive(Debug, Default, Deserialize)]
struct FileParams {
    #[serde(default)]
    return_format: Option<String>,
}

async fn file_content(
    Path((subsidy_id, filename)): Path<(String, String)>,
    Query(params): Query<FileParams>,
) -> ApiError {
    info!(
        subsidy_id = %subsidy_id,
        filename = %filename,
        return_format = params.return_format.as_deref().unwrap_or("markdown"),
        "file content requested"
    );
    ApiError::not_implemented(crate::FILE_CONTENT_NOT_IMPLEMENTED)
}
