// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route table and request handlers.

use crate::dto::{
    PipelineDetail, PipelineView, RecentParams, StartPipelineRequest, StartedPipeline,
    StoppedPipeline, TemplateDetails,
};
use crate::{ApiError, PipelineService};
use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::time::Instant;

/// Build the HTTP router over a pipeline service.
pub fn router(service: PipelineService) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ping", get(ping))
        .route("/pipelines/templates", get(list_templates))
        .route("/pipelines/templates/{id}", get(template_details))
        .route("/pipelines/running", get(running_pipelines))
        .route("/pipelines/recent", get(recent_pipelines))
        .route("/pipelines/{id}/start", post(start_pipeline))
        .route("/pipelines/{id}/stop", post(stop_pipeline))
        .route("/pipelines/{id}", get(pipeline_detail))
        .layer(middleware::from_fn(trace_requests))
        .with_state(service)
}

async fn trace_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();
    tracing::trace!(%method, %uri, "request");
    let response = next.run(request).await;
    tracing::trace!(
        %method,
        %uri,
        status = %response.status(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "response"
    );
    response
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Clowder Server is running!"}))
}

async fn ping() -> Json<Value> {
    Json(json!({"pong": true}))
}

async fn list_templates(
    State(service): State<PipelineService>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(service.list_templates()?))
}

async fn template_details(
    State(service): State<PipelineService>,
    Path(id): Path<String>,
) -> Result<Json<TemplateDetails>, ApiError> {
    service
        .template_details(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))
}

async fn start_pipeline(
    State(service): State<PipelineService>,
    Path(id): Path<String>,
    Json(request): Json<StartPipelineRequest>,
) -> Result<Json<StartedPipeline>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }
    Ok(Json(service.start_pipeline(&id, &request)?))
}

async fn stop_pipeline(
    State(service): State<PipelineService>,
    Path(id): Path<String>,
) -> Result<Json<StoppedPipeline>, ApiError> {
    Ok(Json(service.stop_pipeline(&id)?))
}

async fn running_pipelines(
    State(service): State<PipelineService>,
) -> Result<Json<Vec<PipelineView>>, ApiError> {
    Ok(Json(service.running_pipelines()?))
}

async fn recent_pipelines(
    State(service): State<PipelineService>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<PipelineView>>, ApiError> {
    Ok(Json(service.recent_pipelines(params.limit)?))
}

async fn pipeline_detail(
    State(service): State<PipelineService>,
    Path(id): Path<String>,
) -> Result<Json<PipelineDetail>, ApiError> {
    service
        .pipeline_detail(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Pipeline not found".to_string()))
}

#[cfg(test)]
#[path = "api_tests.rs"]
mod tests;
