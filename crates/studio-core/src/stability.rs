//! Client for the Stability AI image generation endpoint.

use crate::{Result, StudioError};
use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

const GENERATE_PATH: &str = "/v2beta/stable-image/generate/sd3";

/// Parameters of one outbound generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model: String,
    pub seed: Option<i64>,
    pub aspect_ratio: String,
    pub output_format: String,
}

/// Raw image returned by a successful call.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
}

/// External image generation service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Issue a single request. Non-success responses become
    /// [`StudioError::GenerationFailed`].
    async fn generate(&self, api_key: &str, request: &GenerationRequest)
        -> Result<GeneratedImage>;
}

/// Multipart HTTP client for the SD3 endpoint.
pub struct StabilityClient {
    http: Client,
    base_url: String,
}

impl StabilityClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, GENERATE_PATH)
    }
}

fn build_form(request: &GenerationRequest) -> Form {
    let mut form = Form::new()
        .text("prompt", request.prompt.clone())
        .text("output_format", request.output_format.clone())
        .text("model", request.model.clone())
        .text("aspect_ratio", request.aspect_ratio.clone());
    if let Some(negative) = request.negative_prompt.as_deref().filter(|n| !n.trim().is_empty()) {
        form = form.text("negative_prompt", negative.to_string());
    }
    if let Some(seed) = request.seed {
        form = form.text("seed", seed.to_string());
    }
    form
}

#[async_trait]
impl ImageGenerator for StabilityClient {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage> {
        debug!(
            target: "studio::generation",
            "Requesting {} image (model {}, aspect {})",
            request.output_format,
            request.model,
            request.aspect_ratio
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key.trim())
            .header(reqwest::header::ACCEPT, "image/*")
            .multipart(build_form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target: "studio::generation", "Generation API returned {}: {}", status, body);
            return Err(StudioError::GenerationFailed {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?.to_vec();
        Ok(GeneratedImage { bytes })
    }
}
