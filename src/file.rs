// File-per-key storage with advisory locking

use crate::storage::{KeyValueStorage, validate_key};
use eyre::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each key as `<dir>/<key>.json`
///
/// Each `get` and `set` holds a lock for its own duration only. Two writers
/// that each read, modify and write the same key do not see each other's
/// change; the last `set` wins.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create store directory")?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.key_path(key);

        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to open storage file"),
        };

        file.lock_shared().context("Failed to acquire file lock")?;

        let mut value = String::new();
        file.read_to_string(&mut value).context("Failed to read storage file")?;

        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.key_path(key);

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .context("Failed to open storage file for writing")?;

        // Truncate only once we hold the lock so readers never see a half-cleared file
        file.lock_exclusive().context("Failed to acquire file lock")?;
        file.set_len(0)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;

        debug!(file = ?path, bytes = value.len(), "Wrote storage file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_key() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get("shoppingItems").unwrap(), None);
    }

    #[test]
    fn test_set_writes_key_file() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage.set("shoppingItems", "[]").unwrap();

        let content = fs::read_to_string(temp.path().join("shoppingItems.json")).unwrap();
        assert_eq!(content, "[]");
    }

    #[test]
    fn test_shorter_value_replaces_longer() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        storage
            .set("shoppingItems", r#"[{"id":"a","name":"Eggs","completed":false}]"#)
            .unwrap();
        storage.set("shoppingItems", "[]").unwrap();

        assert_eq!(storage.get("shoppingItems").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_path_traversal_key_rejected() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();
        assert!(storage.set("../outside", "[]").is_err());
        assert!(storage.get("../outside").is_err());
    }
}
