//! Project directories and the single active project database.

use crate::{ensure_schema, Result, StudioError};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use studio_types::{meta_keys, ProjectSummary};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{debug, info};

/// Database file inside every project directory.
pub const STORE_FILE_NAME: &str = "project.db";

/// Subdirectory receiving generated images.
pub const IMAGES_DIR: &str = "images";

struct ActiveProject {
    path: PathBuf,
    conn: Connection,
}

/// Owns at most one open project database.
///
/// `open` and `close` take the lifecycle lock exclusively. Long-running work
/// against the active project holds a [`ProjectLease`] so the project cannot be
/// swapped out underneath it.
pub struct ProjectStore {
    active: Mutex<Option<ActiveProject>>,
    lifecycle: RwLock<()>,
}

/// Shared hold on the current project; blocks `open`/`close` while alive.
pub struct ProjectLease<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectStore {
    /// Create a store with no project open.
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
            lifecycle: RwLock::new(()),
        }
    }

    /// Read a project's summary without touching the active project.
    pub fn inspect(path: &Path) -> Result<ProjectSummary> {
        let db_path = path.join(STORE_FILE_NAME);
        if !db_path.exists() {
            return Err(StudioError::NotAProject(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let summary = read_summary(&conn, path)?;
        drop(conn);
        Ok(summary)
    }

    /// Initialize a new project at `path`. The project is not opened.
    pub fn create(path: &Path) -> Result<ProjectSummary> {
        if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
            return Err(StudioError::InvalidInput(
                "project path cannot be empty".to_string(),
            ));
        }

        let db_path = path.join(STORE_FILE_NAME);
        if db_path.exists() {
            return Err(StudioError::AlreadyExists(path.to_path_buf()));
        }

        std::fs::create_dir_all(path.join(IMAGES_DIR))?;

        let mut conn = Connection::open(&db_path)?;
        ensure_schema(&conn)?;

        let name = dir_name(path);
        let now = now_timestamp();
        let tx = conn.transaction()?;
        for (key, value) in [
            (meta_keys::NAME, name.as_str()),
            (meta_keys::CREATED_AT, now.as_str()),
            (meta_keys::LAST_OPENED, now.as_str()),
        ] {
            tx.execute(
                "INSERT INTO project_info (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        drop(conn);

        info!(target: "studio::project", "Created project {:?} at {}", name, path.display());

        Ok(ProjectSummary {
            name,
            path: path.to_path_buf(),
            created_at: now.clone(),
            last_opened: now,
        })
    }

    /// Make `path` the active project, closing any project already open.
    pub async fn open(&self, path: &Path) -> Result<()> {
        let _lifecycle = self.lifecycle.write().await;

        let db_path = path.join(STORE_FILE_NAME);
        if !db_path.exists() {
            return Err(StudioError::NotAProject(path.to_path_buf()));
        }

        let previous = self.lock_active().take();
        if let Some(previous) = previous {
            debug!(target: "studio::project", "Closing {} before opening {}", previous.path.display(), path.display());
        }

        let conn = Connection::open(&db_path)?;
        ensure_schema(&conn)?;
        conn.execute(
            "INSERT INTO project_info (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![meta_keys::LAST_OPENED, now_timestamp()],
        )?;

        *self.lock_active() = Some(ActiveProject {
            path: path.to_path_buf(),
            conn,
        });

        info!(target: "studio::project", "Opened project {}", path.display());
        Ok(())
    }

    /// Summary of the active project, `None` when nothing is open.
    pub fn current(&self) -> Result<Option<ProjectSummary>> {
        let active = self.lock_active();
        match active.as_ref() {
            Some(project) => Ok(Some(read_summary(&project.conn, &project.path)?)),
            None => Ok(None),
        }
    }

    /// Close the active project, if any.
    pub async fn close(&self) {
        let _lifecycle = self.lifecycle.write().await;
        if let Some(previous) = self.lock_active().take() {
            info!(target: "studio::project", "Closed project {}", previous.path.display());
        }
    }

    /// Path of the active project.
    pub fn active_path(&self) -> Option<PathBuf> {
        self.lock_active().as_ref().map(|p| p.path.clone())
    }

    /// `<active project>/images`, `None` when nothing is open.
    pub fn images_directory(&self) -> Option<PathBuf> {
        self.active_path().map(|path| path.join(IMAGES_DIR))
    }

    /// Hold the current project in place until the lease is dropped.
    pub async fn lease(&self) -> ProjectLease<'_> {
        ProjectLease {
            _guard: self.lifecycle.read().await,
        }
    }

    /// Run `f` against the active connection.
    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let mut active = self.lock_active();
        match active.as_mut() {
            Some(project) => f(&mut project.conn),
            None => Err(StudioError::NoActiveProject),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveProject>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_summary(conn: &Connection, path: &Path) -> Result<ProjectSummary> {
    let read = |key: &str| -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT value FROM project_info WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    };

    Ok(ProjectSummary {
        name: read(meta_keys::NAME)?
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| dir_name(path)),
        path: path.to_path_buf(),
        created_at: read(meta_keys::CREATED_AT)?.unwrap_or_default(),
        last_opened: read(meta_keys::LAST_OPENED)?.unwrap_or_default(),
    })
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
