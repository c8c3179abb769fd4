// YAML configuration

use crate::codec::DEFAULT_KEY;
use crate::file::FileStorage;
use crate::sqlite::SqliteStorage;
use crate::storage::{KeyValueStorage, MemoryStorage};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Where the list is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    File,
    Memory,
}

impl FromStr for Backend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sqlite" => Ok(Backend::Sqlite),
            "file" => Ok(Backend::File),
            "memory" => Ok(Backend::Memory),
            other => Err(eyre!("Invalid backend: {} (expected sqlite, file or memory)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub backend: Backend,
    /// Directory holding the backend's files; defaults to `<data_dir>/shoplist`
    pub store_path: Option<PathBuf>,
    pub key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            store_path: None,
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(config = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context(format!("Failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file {}", path.display()))?;

        debug!(config = ?path, backend = ?config.backend, "Loaded config");
        Ok(config)
    }

    /// Apply command-line values on top of the file; `None` keeps the file value
    pub fn with_overrides(mut self, backend: Option<Backend>, store_path: Option<PathBuf>) -> Self {
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(store_path) = store_path {
            self.store_path = Some(store_path);
        }
        self
    }

    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(p) => Ok(p.clone()),
            None => dirs::data_dir()
                .map(|d| d.join("shoplist"))
                .ok_or_else(|| eyre!("Could not determine data directory; set store-path")),
        }
    }

    /// Open the configured backend
    pub fn open_storage(&self) -> Result<Box<dyn KeyValueStorage>> {
        let storage: Box<dyn KeyValueStorage> = match self.backend {
            Backend::Sqlite => Box::new(SqliteStorage::open(self.resolved_store_path()?)?),
            Backend::File => Box::new(FileStorage::open(self.resolved_store_path()?)?),
            Backend::Memory => Box::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shoplist").join("shoplist.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(Some(&temp.path().join("missing.yml"))).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.key, "shoppingItems");
        assert_eq!(config.backend, Backend::Sqlite);
    }

    #[test]
    fn test_load_full_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shoplist.yml");
        fs::write(&path, "backend: file\nstore-path: /tmp/lists\nkey: groceries\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/lists")));
        assert_eq!(config.key, "groceries");
    }

    #[test]
    fn test_load_partial_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shoplist.yml");
        fs::write(&path, "backend: memory\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.key, DEFAULT_KEY);
        assert!(config.store_path.is_none());
    }

    #[test]
    fn test_load_invalid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shoplist.yml");
        fs::write(&path, "backend: postgres\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_flags_override_file_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shoplist.yml");
        fs::write(&path, "backend: file\nstore-path: /tmp/lists\nkey: groceries\n").unwrap();

        let config = Config::load(Some(&path))
            .unwrap()
            .with_overrides(Some(Backend::Sqlite), Some(PathBuf::from("/tmp/other")));

        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/other")));
        assert_eq!(config.key, "groceries");
    }

    #[test]
    fn test_no_flags_keep_file_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shoplist.yml");
        fs::write(&path, "backend: file\nstore-path: /tmp/lists\n").unwrap();

        let config = Config::load(Some(&path)).unwrap().with_overrides(None, None);

        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.store_path, Some(PathBuf::from("/tmp/lists")));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("sqlite".parse::<Backend>().unwrap(), Backend::Sqlite);
        assert_eq!("file".parse::<Backend>().unwrap(), Backend::File);
        assert!("redis".parse::<Backend>().is_err());
    }

    #[test]
    fn test_open_storage_uses_store_path() {
        let temp = TempDir::new().unwrap();
        let config = Config {
            backend: Backend::File,
            store_path: Some(temp.path().to_path_buf()),
            key: DEFAULT_KEY.to_string(),
        };

        let mut storage = config.open_storage().unwrap();
        storage.set(DEFAULT_KEY, "[]").unwrap();
        assert!(temp.path().join("shoppingItems.json").exists());
    }
}
