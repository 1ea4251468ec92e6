//! Project store and generation orchestration for the image studio.

mod app_config;
mod aspect;
mod error;
mod events;
mod generations;
mod orchestrator;
mod project_store;
mod schema;
mod stability;

pub use app_config::{AppConfigFile, CredentialStore, RecentProjects, CONFIG_FILE_NAME};
pub use aspect::{aspect_ratio, ASPECT_CANDIDATES};
pub use error::StudioError;
pub use events::GenerationEvents;
pub use generations::GenerationRecorder;
pub use orchestrator::{image_file_name, GenerationOrchestrator, DEFAULT_MODEL, OUTPUT_FORMAT};
pub use project_store::{ProjectLease, ProjectStore, IMAGES_DIR, STORE_FILE_NAME};
pub use schema::ensure_schema;
pub use stability::{GeneratedImage, GenerationRequest, ImageGenerator, StabilityClient};

/// Result type for studio operations.
pub type Result<T> = std::result::Result<T, StudioError>;
