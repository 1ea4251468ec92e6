//! Generation log of the active project.

use crate::{ProjectStore, Result};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
use studio_types::{GenerationRecord, NewGeneration};
use tracing::debug;

const SELECT_COLUMNS: &str = "id, prompt, negative_prompt, model, seed, steps, guidance, \
     width, height, image_path, created_at";

/// Appends and reads generation records through the active project handle.
#[derive(Clone)]
pub struct GenerationRecorder {
    store: Arc<ProjectStore>,
}

impl GenerationRecorder {
    pub fn new(store: Arc<ProjectStore>) -> Self {
        Self { store }
    }

    /// Insert a record. The store assigns `id` and `created_at`.
    pub fn append(&self, record: &NewGeneration) -> Result<i64> {
        self.store.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                r#"
                INSERT INTO generations (
                    prompt, negative_prompt, model, seed, steps, guidance,
                    width, height, image_path, created_at
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                    strftime('%Y-%m-%d %H:%M:%f', 'now')
                )
                "#,
                params![
                    record.prompt,
                    record.negative_prompt,
                    record.model,
                    record.seed,
                    record.steps,
                    record.guidance,
                    record.width,
                    record.height,
                    record.image_path,
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            debug!(target: "studio::generation", "Recorded generation {}", id);
            Ok(id)
        })
    }

    /// Most recent records first; ties on `created_at` fall back to insertion order.
    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<GenerationRecord>> {
        self.store.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM generations ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                SELECT_COLUMNS
            ))?;
            let records = stmt
                .query_map(params![limit, offset], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
    }

    /// Look up a single record.
    pub fn get_by_id(&self, id: i64) -> Result<Option<GenerationRecord>> {
        self.store.with_connection(|conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {} FROM generations WHERE id = ?1", SELECT_COLUMNS),
                    params![id],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
    }
}

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<GenerationRecord> {
    Ok(GenerationRecord {
        id: row.get("id")?,
        prompt: row.get("prompt")?,
        negative_prompt: row.get("negative_prompt")?,
        model: row.get("model")?,
        seed: row.get("seed")?,
        steps: row.get("steps")?,
        guidance: row.get("guidance")?,
        width: row.get("width")?,
        height: row.get("height")?,
        image_path: row.get("image_path")?,
        created_at: row.get("created_at")?,
    })
}
