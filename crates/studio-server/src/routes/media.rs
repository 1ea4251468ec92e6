//! Serves generated images from the active project.

use super::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use studio_core::StudioError;

pub async fn serve(
    State(state): State<Arc<AppState>>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    if !is_plain_file_name(&file) {
        return Err(StudioError::InvalidInput(format!("invalid image name: {}", file)).into());
    }

    let images_dir = state
        .projects
        .images_directory()
        .ok_or(StudioError::NoActiveProject)?;

    match tokio::fs::read(images_dir.join(&file)).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((StatusCode::NOT_FOUND, "image not found").into_response())
        }
        Err(e) => Err(StudioError::Io(e).into()),
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && std::path::Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

fn content_type(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
