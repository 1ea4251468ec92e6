//! HTTP route handlers.

pub mod generations;
pub mod media;
pub mod projects;
pub mod settings;
pub mod ws;

use crate::state::AppState;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use studio_core::StudioError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Route error carrying a core error to the client as `{ code, message }`.
pub struct ApiError(pub StudioError);

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            StudioError::NotAProject(_) => StatusCode::NOT_FOUND,
            StudioError::AlreadyExists(_) => StatusCode::CONFLICT,
            StudioError::NoActiveProject | StudioError::NoOpenProject => StatusCode::CONFLICT,
            StudioError::MissingCredential => StatusCode::PRECONDITION_REQUIRED,
            StudioError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StudioError::GenerationFailed { .. } | StudioError::Http(_) => StatusCode::BAD_GATEWAY,
            StudioError::Store(_)
            | StudioError::FileWrite { .. }
            | StudioError::Io(_)
            | StudioError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "studio::api", "{}", self.0);
        } else {
            tracing::debug!(target: "studio::api", "{}", self.0);
        }
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.user_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// All API and websocket routes.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route(
            "/api-key",
            get(settings::get_api_key).put(settings::set_api_key),
        )
        .route("/api-key/status", get(settings::api_key_status))
        .route("/recent-projects", get(projects::recent))
        .route("/projects", post(projects::create))
        .route("/projects/inspect", get(projects::inspect))
        .route("/projects/open", post(projects::open))
        .route("/projects/current", get(projects::current))
        .route("/projects/close", post(projects::close))
        .route("/generations", get(generations::list))
        .route("/generations/{id}", get(generations::get))
        .route("/generate", post(generations::generate));

    Router::new()
        .nest("/api", api_routes)
        .route("/media/{file}", get(media::serve))
        .route("/ws/events", get(ws::upgrade))
        .with_state(state)
}
