// SQLite-backed key-value storage

use crate::storage::{KeyValueStorage, validate_key};
use eyre::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CURRENT_VERSION: u32 = 1;

/// Key-value storage in a single SQLite table
pub struct SqliteStorage {
    base_path: PathBuf,
    db: Connection,
}

impl SqliteStorage {
    /// Open or create `shoplist.db` inside the given directory
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path).context("Failed to create store directory")?;

        let db_path = base_path.join("shoplist.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self { base_path, db };
        storage.create_schema()?;
        storage.write_version()?;

        debug!(path = ?db_path, "Opened SQLite storage");
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating database schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        let value = self
            .db
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .context("Failed to read from SQLite storage")?;

        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, now_ms()],
            )
            .context("Failed to write to SQLite storage")?;

        debug!(key, bytes = value.len(), "Wrote value to SQLite storage");
        Ok(())
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
