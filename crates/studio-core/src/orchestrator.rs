//! Image generation for the active project.
//!
//! A generation checks its preconditions, derives the request, makes one call to
//! the image API, writes the image into the project's images directory, records
//! it, and broadcasts a [`GenerationCreated`] event. The project lease is held for
//! the whole sequence so the image and its record land in the same project.

use crate::{
    aspect_ratio, CredentialStore, GenerationEvents, GenerationRecorder, GenerationRequest,
    ImageGenerator, ProjectStore, Result, StudioError,
};
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::Arc;
use studio_types::{GenerateInput, GenerateOutput, GenerationCreated, NewGeneration};
use tracing::{info, warn};
use uuid::Uuid;

/// Model used when the caller leaves the model blank.
pub const DEFAULT_MODEL: &str = "sd3.5-large";

/// Output format requested from the API; also the file extension.
pub const OUTPUT_FORMAT: &str = "png";

const SUFFIX_LEN: usize = 6;

/// Coordinates a single generation against the active project.
pub struct GenerationOrchestrator {
    store: Arc<ProjectStore>,
    recorder: GenerationRecorder,
    credentials: Arc<dyn CredentialStore>,
    generator: Arc<dyn ImageGenerator>,
    events: GenerationEvents,
    default_model: String,
}

impl GenerationOrchestrator {
    pub fn new(
        store: Arc<ProjectStore>,
        credentials: Arc<dyn CredentialStore>,
        generator: Arc<dyn ImageGenerator>,
        events: GenerationEvents,
    ) -> Self {
        Self {
            recorder: GenerationRecorder::new(store.clone()),
            store,
            credentials,
            generator,
            events,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the model used for blank model input.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.default_model = model.trim().to_string();
        }
        self
    }

    pub fn events(&self) -> &GenerationEvents {
        &self.events
    }

    pub fn recorder(&self) -> &GenerationRecorder {
        &self.recorder
    }

    /// Generate one image into the active project.
    pub async fn generate(&self, input: GenerateInput) -> Result<GenerateOutput> {
        let api_key = self
            .credentials
            .get()?
            .filter(|key| !key.trim().is_empty())
            .ok_or(StudioError::MissingCredential)?;

        let _lease = self.store.lease().await;
        let images_dir = self
            .store
            .images_directory()
            .ok_or(StudioError::NoOpenProject)?;

        if input.prompt.trim().is_empty() {
            return Err(StudioError::InvalidInput("prompt cannot be empty".to_string()));
        }

        let request = self.build_request(&input)?;
        info!(
            target: "studio::generation",
            "Generating image (model {}, aspect {}) into {}",
            request.model,
            request.aspect_ratio,
            images_dir.display()
        );

        let image = self.generator.generate(api_key.trim(), &request).await?;

        let file_name = image_file_name(Local::now());
        let image_path = images_dir.join(&file_name);
        write_image(&images_dir, &image_path, &image.bytes).await?;

        let record = NewGeneration {
            prompt: input.prompt,
            negative_prompt: request.negative_prompt.clone(),
            model: Some(request.model.clone()),
            seed: request.seed,
            steps: input.steps,
            guidance: input.cfg_scale,
            width: input.width,
            height: input.height,
            image_path: file_name,
        };

        let id = match self.recorder.append(&record) {
            Ok(id) => id,
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&image_path).await {
                    warn!(
                        target: "studio::generation",
                        "Could not remove unrecorded image {}: {}",
                        image_path.display(),
                        remove_err
                    );
                }
                return Err(e);
            }
        };

        let output = GenerateOutput { id, image_path };
        info!(target: "studio::generation", "Generation {} saved to {}", id, output.image_path.display());
        self.events.publish(GenerationCreated::from(&output));
        Ok(output)
    }

    fn build_request(&self, input: &GenerateInput) -> Result<GenerationRequest> {
        let model = input
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string();

        let seed = match input.seed.as_deref().map(str::trim) {
            Some(seed) if !seed.is_empty() => Some(seed.parse::<i64>().map_err(|_| {
                StudioError::InvalidInput(format!("seed must be an integer, got {:?}", seed))
            })?),
            _ => None,
        };

        Ok(GenerationRequest {
            prompt: input.prompt.clone(),
            negative_prompt: input
                .negative_prompt
                .clone()
                .filter(|n| !n.trim().is_empty()),
            model,
            seed,
            aspect_ratio: aspect_ratio(input.width, input.height).to_string(),
            output_format: OUTPUT_FORMAT.to_string(),
        })
    }
}

/// `YYYYMMDD_HHMMSS_<random hex>.png` for the given local time.
pub fn image_file_name(now: DateTime<Local>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{}",
        now.format("%Y%m%d_%H%M%S"),
        &suffix[..SUFFIX_LEN],
        OUTPUT_FORMAT
    )
}

async fn write_image(images_dir: &Path, image_path: &Path, bytes: &[u8]) -> Result<()> {
    let to_write_error = |source: std::io::Error| StudioError::FileWrite {
        path: image_path.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(images_dir)
        .await
        .map_err(to_write_error)?;
    tokio::fs::write(image_path, bytes)
        .await
        .map_err(to_write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GeneratedImage, IMAGES_DIR};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::broadcast::error::TryRecvError;

    struct StaticKey(Option<String>);

    impl CredentialStore for StaticKey {
        fn get(&self) -> Result<Option<String>> {
            Ok(self.0.clone())
        }

        fn set(&self, _api_key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeGenerator {
        calls: AtomicUsize,
        fail_with: Option<(u16, String)>,
        last_request: Mutex<Option<(String, GenerationRequest)>>,
    }

    #[async_trait]
    impl ImageGenerator for FakeGenerator {
        async fn generate(
            &self,
            api_key: &str,
            request: &GenerationRequest,
        ) -> Result<GeneratedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((api_key.to_string(), request.clone()));
            match &self.fail_with {
                Some((status, body)) => Err(StudioError::GenerationFailed {
                    status: *status,
                    body: body.clone(),
                }),
                None => Ok(GeneratedImage {
                    bytes: b"fake-png".to_vec(),
                }),
            }
        }
    }

    struct Fixture {
        orchestrator: GenerationOrchestrator,
        store: Arc<ProjectStore>,
        generator: Arc<FakeGenerator>,
        project: std::path::PathBuf,
        _dir: TempDir,
    }

    async fn fixture(key: Option<&str>, generator: FakeGenerator, open: bool) -> Fixture {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        ProjectStore::create(&project).unwrap();
        let store = Arc::new(ProjectStore::new());
        if open {
            store.open(&project).await.unwrap();
        }
        let generator = Arc::new(generator);
        let orchestrator = GenerationOrchestrator::new(
            store.clone(),
            Arc::new(StaticKey(key.map(str::to_string))),
            generator.clone(),
            GenerationEvents::new(),
        );
        Fixture {
            orchestrator,
            store,
            generator,
            project,
            _dir: dir,
        }
    }

    fn input(prompt: &str) -> GenerateInput {
        GenerateInput {
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    fn image_count(project: &Path) -> usize {
        std::fs::read_dir(project.join(IMAGES_DIR)).unwrap().count()
    }

    #[test]
    fn test_image_file_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap();
        let name = image_file_name(now);
        assert!(name.starts_with("20240309_070502_"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), "20240309_070502_".len() + SUFFIX_LEN + ".png".len());
        assert_ne!(image_file_name(now), image_file_name(now));
    }

    #[tokio::test]
    async fn test_missing_credential_checked_first() {
        let f = fixture(None, FakeGenerator::default(), false).await;
        let err = f.orchestrator.generate(input("cat")).await.unwrap_err();
        assert!(matches!(err, StudioError::MissingCredential));

        let f = fixture(Some("  "), FakeGenerator::default(), true).await;
        let err = f.orchestrator.generate(input("cat")).await.unwrap_err();
        assert!(matches!(err, StudioError::MissingCredential));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_open_project() {
        let f = fixture(Some("sk"), FakeGenerator::default(), false).await;
        let err = f.orchestrator.generate(input("cat")).await.unwrap_err();
        assert!(matches!(err, StudioError::NoOpenProject));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(image_count(&f.project), 0);
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_api() {
        let f = fixture(Some("sk"), FakeGenerator::default(), true).await;
        let err = f.orchestrator.generate(input("   ")).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bad_seed_rejected() {
        let f = fixture(Some("sk"), FakeGenerator::default(), true).await;
        let mut request = input("cat");
        request.seed = Some("lucky".into());
        let err = f.orchestrator.generate(request).await.unwrap_err();
        assert!(matches!(err, StudioError::InvalidInput(_)));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_writes_records_and_notifies() {
        let f = fixture(Some(" sk-live "), FakeGenerator::default(), true).await;
        let mut events = f.orchestrator.events().subscribe();

        let output = f
            .orchestrator
            .generate(GenerateInput {
                prompt: "harbor at dusk".into(),
                negative_prompt: Some("".into()),
                model: Some("  sd3.5-medium ".into()),
                steps: Some(30),
                cfg_scale: Some(7.5),
                width: Some(1152),
                height: Some(896),
                seed: Some(" 99 ".into()),
            })
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output.image_path).unwrap(), b"fake-png");
        assert!(output.image_path.starts_with(f.project.join(IMAGES_DIR)));

        let (key, sent) = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(key, "sk-live");
        assert_eq!(sent.model, "sd3.5-medium");
        assert_eq!(sent.seed, Some(99));
        assert_eq!(sent.aspect_ratio, "9:7");
        assert_eq!(sent.output_format, "png");
        assert_eq!(sent.negative_prompt, None);

        let record = f.orchestrator.recorder().get_by_id(output.id).unwrap().unwrap();
        assert_eq!(record.prompt, "harbor at dusk");
        assert_eq!(record.model.as_deref(), Some("sd3.5-medium"));
        assert_eq!(record.seed, Some(99));
        assert_eq!(record.steps, Some(30));
        assert_eq!(record.guidance, Some(7.5));
        assert_eq!(record.resolve_image(&f.project.join(IMAGES_DIR)), output.image_path);

        let event = events.recv().await.unwrap();
        assert_eq!(event.id, output.id);
        assert_eq!(event.image_path, output.image_path);
    }

    #[tokio::test]
    async fn test_defaults_for_blank_model_and_seed() {
        let f = fixture(Some("sk"), FakeGenerator::default(), true).await;
        let mut request = input("cat");
        request.model = Some("   ".into());
        request.seed = Some("".into());
        f.orchestrator.generate(request).await.unwrap();

        let (_, sent) = f.generator.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.model, DEFAULT_MODEL);
        assert_eq!(sent.seed, None);
        assert_eq!(sent.aspect_ratio, "1:1");
    }

    #[tokio::test]
    async fn test_api_failure_records_nothing() {
        let generator = FakeGenerator {
            fail_with: Some((500, "model overloaded".into())),
            ..Default::default()
        };
        let f = fixture(Some("sk"), generator, true).await;
        let mut events = f.orchestrator.events().subscribe();

        let err = f.orchestrator.generate(input("cat")).await.unwrap_err();
        assert!(matches!(err, StudioError::GenerationFailed { status: 500, .. }));
        assert!(f.orchestrator.recorder().list(10, 0).unwrap().is_empty());
        assert_eq!(image_count(&f.project), 0);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_append_failure_removes_image() {
        let f = fixture(Some("sk"), FakeGenerator::default(), true).await;
        let mut events = f.orchestrator.events().subscribe();
        f.store
            .with_connection(|conn| {
                conn.execute_batch("DROP TABLE generations")?;
                Ok(())
            })
            .unwrap();

        let err = f.orchestrator.generate(input("cat")).await.unwrap_err();
        assert!(matches!(err, StudioError::Store(_)));
        assert_eq!(f.generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(image_count(&f.project), 0);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_ids_increase_across_generations() {
        let f = fixture(Some("sk"), FakeGenerator::default(), true).await;
        let first = f.orchestrator.generate(input("one")).await.unwrap();
        let second = f.orchestrator.generate(input("two")).await.unwrap();
        assert!(second.id > first.id);
        assert_ne!(first.image_path, second.image_path);
        assert_eq!(image_count(&f.project), 2);
    }
}
