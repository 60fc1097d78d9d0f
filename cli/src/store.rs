use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::write_private;

/// Key holding the cookie the browser received after the OAuth redirect.
pub const AUTH_COOKIE_KEY: &str = "auth_cookie";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key/value persistence, the client's equivalent of browser local storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; an unreadable
    /// or malformed one is treated as empty and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries: BTreeMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed state file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "state file unreadable");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(&self.entries)?;
        write_private(&self.path, &data).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("asistente-store-{}-{name}", std::process::id()))
            .join("state.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = temp_path("reopen");
        let mut store = FileStore::open(&path);
        assert_eq!(store.get("agent_session_id"), None);
        store.set("agent_session_id", "angel|abcd1234").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("agent_session_id").as_deref(),
            Some("angel|abcd1234")
        );

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn remove_deletes_only_that_key() {
        let path = temp_path("remove");
        let mut store = FileStore::open(&path);
        store.set("agent_session_id", "angel|11111111").unwrap();
        store.set(AUTH_COOKIE_KEY, "session=abc").unwrap();
        store.remove("agent_session_id").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("agent_session_id"), None);
        assert_eq!(reopened.get(AUTH_COOKIE_KEY).as_deref(), Some("session=abc"));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn malformed_file_is_treated_as_empty() {
        let path = temp_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let mut store = FileStore::open(&path);
        assert_eq!(store.get("agent_session_id"), None);
        store.set("agent_session_id", "angel|22222222").unwrap();
        assert_eq!(
            FileStore::open(&path).get("agent_session_id").as_deref(),
            Some("angel|22222222")
        );

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
