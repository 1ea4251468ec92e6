//! Shared application state.

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use studio_core::{
    AppConfigFile, GenerationEvents, GenerationOrchestrator, GenerationRecorder, ImageGenerator,
    ProjectStore, RecentProjects, StabilityClient,
};

/// Shared application state.
pub struct AppState {
    pub projects: Arc<ProjectStore>,
    pub app_config: Arc<AppConfigFile>,
    pub recent_projects: RecentProjects,
    pub orchestrator: GenerationOrchestrator,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> studio_core::Result<Self> {
        let client = StabilityClient::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_generator(config, Arc::new(client)))
    }

    /// Build state around a specific image generator.
    pub fn with_generator(config: Config, generator: Arc<dyn ImageGenerator>) -> Self {
        let projects = Arc::new(ProjectStore::new());
        let app_config = Arc::new(AppConfigFile::new(config.app_config_path.clone()));
        let recent_projects = RecentProjects::new(app_config.clone(), config.max_recent_projects);
        let orchestrator = GenerationOrchestrator::new(
            projects.clone(),
            app_config.clone(),
            generator,
            GenerationEvents::new(),
        )
        .with_default_model(config.default_model.clone());

        Self {
            projects,
            app_config,
            recent_projects,
            orchestrator,
            config,
        }
    }

    pub fn generations(&self) -> &GenerationRecorder {
        self.orchestrator.recorder()
    }

    pub fn events(&self) -> &GenerationEvents {
        self.orchestrator.events()
    }
}
