//! Project lifecycle routes.

use super::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use studio_core::ProjectStore;
use studio_types::ProjectSummary;
use tracing::warn;

#[derive(Deserialize)]
pub struct ProjectPathRequest {
    pub path: PathBuf,
}

#[derive(Serialize)]
pub struct RecentProjectsResponse {
    pub projects: Vec<ProjectSummary>,
}

/// Recent projects that still exist on disk, newest first.
pub async fn recent(State(state): State<Arc<AppState>>) -> Json<RecentProjectsResponse> {
    Json(RecentProjectsResponse {
        projects: state.recent_projects.valid_projects(),
    })
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectPathRequest>,
) -> Result<(StatusCode, Json<ProjectSummary>), ApiError> {
    let summary = ProjectStore::create(&req.path)?;
    remember(&state, &summary.path);
    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn inspect(
    Query(req): Query<ProjectPathRequest>,
) -> Result<Json<ProjectSummary>, ApiError> {
    Ok(Json(ProjectStore::inspect(&req.path)?))
}

pub async fn open(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectPathRequest>,
) -> Result<Json<Option<ProjectSummary>>, ApiError> {
    state.projects.open(&req.path).await?;
    remember(&state, &req.path);
    Ok(Json(state.projects.current()?))
}

pub async fn current(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<ProjectSummary>>, ApiError> {
    Ok(Json(state.projects.current()?))
}

pub async fn close(State(state): State<Arc<AppState>>) -> StatusCode {
    state.projects.close().await;
    StatusCode::NO_CONTENT
}

fn remember(state: &AppState, path: &std::path::Path) {
    if let Err(e) = state.recent_projects.touch(path) {
        warn!(target: "studio::api", "Failed to update recent projects: {}", e);
    }
}
