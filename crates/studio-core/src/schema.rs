//! Project database schema.
//!
//! The schema is fixed and versionless. `ensure_schema` creates missing tables and
//! adds columns that stores written by older builds lack. It never drops tables or
//! columns, so rows outside the defined tables survive.

use crate::Result;
use rusqlite::Connection;
use tracing::debug;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS project_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS generations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prompt TEXT NOT NULL,
    negative_prompt TEXT,
    model TEXT,
    seed INTEGER,
    steps INTEGER,
    guidance REAL,
    width INTEGER,
    height INTEGER,
    image_path TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_generations_created_at ON generations(created_at);
"#;

/// Nullable columns of `generations`, checked on every open.
const GENERATION_COLUMNS: &[(&str, &str)] = &[
    ("negative_prompt", "TEXT"),
    ("model", "TEXT"),
    ("seed", "INTEGER"),
    ("steps", "INTEGER"),
    ("guidance", "REAL"),
    ("width", "INTEGER"),
    ("height", "INTEGER"),
];

/// Bring the store behind `conn` up to the current schema. Idempotent.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES)?;

    for (column, sql_type) in GENERATION_COLUMNS {
        if !has_column(conn, "generations", column)? {
            debug!(target: "studio::project", "Adding missing column generations.{}", column);
            conn.execute_batch(&format!(
                "ALTER TABLE generations ADD COLUMN {} {}",
                column, sql_type
            ))?;
        }
    }

    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info(?1) WHERE name = ?2",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_creates_both_tables() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let tables = table_names(&conn);
        assert!(tables.contains(&"project_info".to_string()));
        assert!(tables.contains(&"generations".to_string()));
    }

    #[test]
    fn test_idempotent_and_keeps_rows() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO project_info (key, value) VALUES ('name', 'demo')",
            [],
        )
        .unwrap();

        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let name: String = conn
            .query_row("SELECT value FROM project_info WHERE key = 'name'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(name, "demo");
    }

    #[test]
    fn test_adds_model_column_to_older_store() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE generations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                prompt TEXT NOT NULL,
                negative_prompt TEXT,
                seed INTEGER,
                steps INTEGER,
                guidance REAL,
                width INTEGER,
                height INTEGER,
                image_path TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            INSERT INTO generations (prompt, image_path) VALUES ('old', 'old.png');
            "#,
        )
        .unwrap();

        ensure_schema(&conn).unwrap();

        assert!(has_column(&conn, "generations", "model").unwrap());
        let prompt: String = conn
            .query_row("SELECT prompt FROM generations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(prompt, "old");
    }

    #[test]
    fn test_leaves_foreign_tables_alone() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE notes (body TEXT); INSERT INTO notes VALUES ('keep');")
            .unwrap();

        ensure_schema(&conn).unwrap();

        let body: String = conn
            .query_row("SELECT body FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(body, "keep");
    }
}
