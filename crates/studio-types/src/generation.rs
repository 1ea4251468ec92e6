//! Generation records and orchestrator inputs/outputs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A persisted image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    /// Store-assigned id, increasing within a project.
    pub id: i64,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
    pub seed: Option<i64>,
    pub steps: Option<i64>,
    pub guidance: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    /// Output file, relative to the project's images directory.
    pub image_path: String,
    /// Store-assigned insert time (UTC, `YYYY-MM-DD HH:MM:SS.SSS`).
    pub created_at: String,
}

impl GenerationRecord {
    /// Absolute location of the output file given the images directory.
    pub fn resolve_image(&self, images_dir: &Path) -> PathBuf {
        images_dir.join(&self.image_path)
    }
}

/// A generation record before the store assigns `id` and `created_at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGeneration {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub model: Option<String>,
    pub seed: Option<i64>,
    pub steps: Option<i64>,
    pub guidance: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub image_path: String,
}

/// Caller input to a generation request.
///
/// Fields mirror the workspace form: `seed` stays textual because the form
/// accepts free text and blank means "random".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateInput {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub steps: Option<i64>,
    #[serde(default)]
    pub cfg_scale: Option<f64>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub seed: Option<String>,
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub id: i64,
    /// Absolute path of the written image.
    pub image_path: PathBuf,
}

/// Event broadcast after a generation is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationCreated {
    pub id: i64,
    pub image_path: PathBuf,
}

impl From<&GenerateOutput> for GenerationCreated {
    fn from(output: &GenerateOutput) -> Self {
        Self {
            id: output.id,
            image_path: output.image_path.clone(),
        }
    }
}
