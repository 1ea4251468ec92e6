//! Per-user app config file: API credential and recent projects.

use crate::{ProjectStore, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use studio_types::ProjectSummary;
use tracing::{debug, warn};

/// File name of the app config inside the user config directory.
pub const CONFIG_FILE_NAME: &str = "stable-diffusion-desktop.config.json";

/// Source of the generation API credential.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<String>>;

    fn set(&self, api_key: &str) -> Result<()>;

    /// Whether a non-blank credential is configured.
    fn has(&self) -> Result<bool> {
        Ok(self.get()?.is_some_and(|key| !key.trim().is_empty()))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
    #[serde(default)]
    recent_projects: Vec<PathBuf>,
    /// Keys written by other versions, preserved on save.
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// JSON config file shared by the credential store and the recent-projects list.
pub struct AppConfigFile {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl AppConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// `<user config dir>/stable-diffusion-desktop/<CONFIG_FILE_NAME>`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stable-diffusion-desktop")
            .join(CONFIG_FILE_NAME)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> ConfigData {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return ConfigData::default(),
            Err(e) => {
                warn!(target: "studio::config", "Error reading {}: {}", self.path.display(), e);
                return ConfigData::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(target: "studio::config", "Ignoring malformed {}: {}", self.path.display(), e);
            ConfigData::default()
        })
    }

    fn update(&self, apply: impl FnOnce(&mut ConfigData)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut data = self.load();
        apply(&mut data);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&data)?)?;
        Ok(())
    }
}

impl CredentialStore for AppConfigFile {
    fn get(&self) -> Result<Option<String>> {
        Ok(self.load().api_key)
    }

    fn set(&self, api_key: &str) -> Result<()> {
        self.update(|data| data.api_key = Some(api_key.to_string()))?;
        debug!(target: "studio::config", "Stored API key");
        Ok(())
    }
}

/// Most-recently-opened project paths, newest first.
#[derive(Clone)]
pub struct RecentProjects {
    config: Arc<AppConfigFile>,
    max_entries: usize,
}

impl RecentProjects {
    pub fn new(config: Arc<AppConfigFile>, max_entries: usize) -> Self {
        Self {
            config,
            max_entries: max_entries.max(1),
        }
    }

    pub fn list(&self) -> Vec<PathBuf> {
        self.config.load().recent_projects
    }

    /// Move `path` to the front of the list.
    pub fn touch(&self, path: &Path) -> Result<()> {
        let max = self.max_entries;
        self.config.update(|data| {
            data.recent_projects.retain(|p| p != path);
            data.recent_projects.insert(0, path.to_path_buf());
            data.recent_projects.truncate(max);
        })
    }

    pub fn remove(&self, path: &Path) -> Result<()> {
        self.config
            .update(|data| data.recent_projects.retain(|p| p != path))
    }

    /// Summaries of listed paths that are still projects.
    pub fn valid_projects(&self) -> Vec<ProjectSummary> {
        self.list()
            .into_iter()
            .filter_map(|path| match ProjectStore::inspect(&path) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    debug!(target: "studio::config", "Skipping recent project {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Arc<AppConfigFile> {
        Arc::new(AppConfigFile::new(dir.path().join("cfg").join(CONFIG_FILE_NAME)))
    }

    #[test]
    fn test_missing_file_has_no_credential() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        assert_eq!(config.get().unwrap(), None);
        assert!(!config.has().unwrap());
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        config.set("sk-123").unwrap();
        assert_eq!(config.get().unwrap().as_deref(), Some("sk-123"));
        assert!(config.has().unwrap());

        let raw = std::fs::read_to_string(config.path()).unwrap();
        assert!(raw.contains("\"apiKey\": \"sk-123\""));
    }

    #[test]
    fn test_blank_credential_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        config.set("   ").unwrap();
        assert!(!config.has().unwrap());
    }

    #[test]
    fn test_malformed_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(config.path().parent().unwrap()).unwrap();
        std::fs::write(config.path(), "{ not json").unwrap();
        assert_eq!(config.get().unwrap(), None);
        config.set("sk-new").unwrap();
        assert_eq!(config.get().unwrap().as_deref(), Some("sk-new"));
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::create_dir_all(config.path().parent().unwrap()).unwrap();
        std::fs::write(config.path(), r#"{"theme":"dark"}"#).unwrap();

        config.set("sk").unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(config.path()).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["apiKey"], "sk");
    }

    #[test]
    fn test_recent_touch_orders_and_dedupes() {
        let dir = TempDir::new().unwrap();
        let recents = RecentProjects::new(config_in(&dir), 3);
        for name in ["a", "b", "c", "a", "d"] {
            recents.touch(Path::new(&format!("/projects/{}", name))).unwrap();
        }
        let listed: Vec<String> = recents
            .list()
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        assert_eq!(listed, vec!["/projects/d", "/projects/a", "/projects/c"]);

        recents.remove(Path::new("/projects/a")).unwrap();
        assert_eq!(recents.list().len(), 2);
    }

    #[test]
    fn test_recent_keeps_credential() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        config.set("sk").unwrap();
        RecentProjects::new(config.clone(), 10)
            .touch(Path::new("/p"))
            .unwrap();
        assert_eq!(config.get().unwrap().as_deref(), Some("sk"));
    }

    #[test]
    fn test_valid_projects_skips_stale_entries() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("real");
        ProjectStore::create(&project).unwrap();

        let recents = RecentProjects::new(config_in(&dir), 10);
        recents.touch(&dir.path().join("gone")).unwrap();
        recents.touch(&project).unwrap();

        let valid = recents.valid_projects();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].name, "real");
        assert_eq!(recents.list().len(), 2);
    }
}
