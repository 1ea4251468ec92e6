//! API key routes.

use super::ApiError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use studio_core::{CredentialStore, StudioError};
use tracing::info;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyStatus {
    pub has_api_key: bool,
}

pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    Ok(Json(ApiKeyResponse {
        api_key: state.app_config.get()?,
    }))
}

pub async fn set_api_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetApiKeyRequest>,
) -> Result<StatusCode, ApiError> {
    let key = req.api_key.trim();
    if key.is_empty() {
        return Err(StudioError::InvalidInput("API key cannot be empty".to_string()).into());
    }
    state.app_config.set(key)?;
    info!(target: "studio::api", "API key updated");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_key_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiKeyStatus>, ApiError> {
    Ok(Json(ApiKeyStatus {
        has_api_key: state.app_config.has()?,
    }))
}
