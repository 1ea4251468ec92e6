//! Generation routes.

use super::{ApiError, ErrorBody};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use studio_types::{GenerateInput, GenerateOutput, GenerationRecord};

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<GenerationRecord>>, ApiError> {
    Ok(Json(state.generations().list(query.limit, query.offset)?))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<GenerationRecord>, Response> {
    match state.generations().get_by_id(id) {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                code: "not_found",
                message: format!("Generation {} not found", id),
            }),
        )
            .into_response()),
        Err(e) => Err(ApiError(e).into_response()),
    }
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GenerateInput>,
) -> Result<Json<GenerateOutput>, ApiError> {
    Ok(Json(state.orchestrator.generate(input).await?))
}
