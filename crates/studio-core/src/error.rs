//! Error types for the image studio.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Not a project: {0} has no project database")]
    NotAProject(PathBuf),

    #[error("This directory is already a project: {0}")]
    AlreadyExists(PathBuf),

    #[error("No project is currently open")]
    NoActiveProject,

    #[error("Open a project before generating images")]
    NoOpenProject,

    #[error("No API key configured")]
    MissingCredential,

    #[error("Generation failed ({status}): {body}")]
    GenerationFailed { status: u16, body: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Generation request failed: {0}")]
    Http(#[from] reqwest::Error),
}

const CREDIT_MARKERS: &[&str] = &["insufficient", "no credit", "payment required", "402"];

impl StudioError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            StudioError::NotAProject(_) => "not_a_project",
            StudioError::AlreadyExists(_) => "already_exists",
            StudioError::NoActiveProject => "no_active_project",
            StudioError::NoOpenProject => "no_open_project",
            StudioError::MissingCredential => "missing_credential",
            StudioError::GenerationFailed { .. } if self.is_insufficient_credit() => {
                "insufficient_credit"
            }
            StudioError::GenerationFailed { .. } => "generation_failed",
            StudioError::InvalidInput(_) => "invalid_input",
            StudioError::Store(_) => "store_error",
            StudioError::FileWrite { .. } => "file_write_error",
            StudioError::Io(_) => "io_error",
            StudioError::Json(_) => "json_error",
            StudioError::Http(_) => "http_error",
        }
    }

    /// Heuristic match for an out-of-credit response from the generation API.
    ///
    /// Not a structural contract: the API reports this as free text.
    pub fn is_insufficient_credit(&self) -> bool {
        match self {
            StudioError::GenerationFailed { status, body } => {
                if *status == 402 {
                    return true;
                }
                let lower = body.to_lowercase();
                CREDIT_MARKERS.iter().any(|marker| lower.contains(marker))
            }
            _ => false,
        }
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            StudioError::GenerationFailed { .. } if self.is_insufficient_credit() => {
                "Generation failed: insufficient credits. Please top up your Stability account."
                    .to_string()
            }
            StudioError::MissingCredential => {
                "Add your Stability API key in settings before generating.".to_string()
            }
            StudioError::NotAProject(_) => {
                "The selected folder is not a valid project.".to_string()
            }
            other => other.to_string(),
        }
    }
}
