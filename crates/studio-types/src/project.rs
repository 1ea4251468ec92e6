//! Project types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata keys stored in the `project_info` table.
pub mod meta_keys {
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "created_at";
    pub const LAST_OPENED: &str = "last_opened";
}

/// Summary of a project directory, read from its metadata rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// Display name (defaults to the directory name).
    pub name: String,
    /// Project directory.
    pub path: PathBuf,
    /// RFC 3339 creation timestamp, empty when unknown.
    pub created_at: String,
    /// RFC 3339 timestamp of the last open, empty when unknown.
    pub last_opened: String,
}
