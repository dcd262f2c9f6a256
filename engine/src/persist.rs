//! Persistence port: keyed JSON text blobs behind a small trait, so callers can swap
//! an in-memory map for files (or anything else) without touching their logic.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
    #[error("storage io error for {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait Persistence {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        (**self).save(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Persistence for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Persistence for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .and_then(|_| atomic_write(&path, value.as_bytes()))
            .map_err(|source| PersistError::Io {
                key: key.to_string(),
                source,
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(PersistError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            // Rename over an existing file can fail on Windows.
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    state: &'a T,
}

/// Loads a `{ "version": n, "state": ... }` envelope. Missing, corrupt or
/// version-mismatched data yields `T::default()`.
pub fn load_versioned<T, P>(store: &P, key: &str, version: u32) -> T
where
    T: DeserializeOwned + Default,
    P: Persistence + ?Sized,
{
    let text = match store.load(key) {
        Ok(Some(text)) => text,
        Ok(None) => return T::default(),
        Err(err) => {
            log::warn!("failed to read {key}: {err}");
            return T::default();
        }
    };

    let mut value: serde_json::Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("discarding corrupt {key}: {err}");
            return T::default();
        }
    };

    let stored = value.get("version").and_then(serde_json::Value::as_u64);
    if stored != Some(u64::from(version)) {
        log::info!("resetting {key}: stored version {stored:?}, expected {version}");
        return T::default();
    }

    match serde_json::from_value(value["state"].take()) {
        Ok(state) => state,
        Err(err) => {
            log::warn!("discarding undecodable {key}: {err}");
            T::default()
        }
    }
}

pub fn save_versioned<T, P>(store: &mut P, key: &str, version: u32, state: &T) -> Result<(), PersistError>
where
    T: Serialize,
    P: Persistence + ?Sized,
{
    let text = serde_json::to_string(&EnvelopeRef { version, state }).map_err(|source| {
        PersistError::Encode {
            key: key.to_string(),
            source,
        }
    })?;
    store.save(key, &text)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn versioned_round_trip_through_memory() {
        let mut store = MemoryStore::new();
        save_versioned(&mut store, "counter", 2, &Counter { hits: 7 }).unwrap();
        let loaded: Counter = load_versioned(&store, "counter", 2);
        assert_eq!(loaded, Counter { hits: 7 });
    }

    #[test]
    fn version_mismatch_resets_to_default() {
        let mut store = MemoryStore::new();
        save_versioned(&mut store, "counter", 1, &Counter { hits: 7 }).unwrap();
        let loaded: Counter = load_versioned(&store, "counter", 2);
        assert_eq!(loaded, Counter::default());
    }

    #[test]
    fn corrupt_payload_resets_to_default() {
        let mut store = MemoryStore::new();
        store.insert_raw("counter", "{not json");
        let loaded: Counter = load_versioned(&store, "counter", 1);
        assert_eq!(loaded, Counter::default());

        store.insert_raw("counter", r#"{"version":1,"state":{"hits":"many"}}"#);
        let loaded: Counter = load_versioned(&store, "counter", 1);
        assert_eq!(loaded, Counter::default());
    }

    #[test]
    fn file_store_saves_loads_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.load("board").unwrap(), None);
        store.save("board", "[1,2,3]").unwrap();
        assert_eq!(store.load("board").unwrap().as_deref(), Some("[1,2,3]"));
        assert!(dir.path().join("nested").join("board.json").exists());

        store.remove("board").unwrap();
        assert_eq!(store.load("board").unwrap(), None);
        store.remove("board").unwrap();
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let store = FileStore::new("unused");
        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                store.path_for(key),
                Err(PersistError::InvalidKey(_))
            ));
        }
    }
}
