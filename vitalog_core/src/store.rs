//! Persistent key-value document store with file locking.
//!
//! Engine and journal state are serialized as one JSON document per
//! logical key. The file-backed store writes atomically (temp file,
//! sync, rename) and degrades to "document absent" on unreadable or
//! corrupted files so a bad disk never blocks in-memory operation.

use crate::Result;
use fs2::FileExt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Keyed JSON document storage
pub trait StateStore {
    /// Load the document stored under `key`, or None if absent
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Persist the document under `key`
    fn save(&self, key: &str, doc: &serde_json::Value) -> Result<()>;
}

/// File-backed store keeping one `<key>.json` per document
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for JsonFileStore {
    /// Load a document with shared locking.
    ///
    /// Returns None if the file doesn't exist. If the file is corrupted
    /// or unreadable, logs a warning and returns None as well.
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            tracing::debug!("No document for key '{}' at {:?}", key, path);
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open {:?}: {}. Treating as absent.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read {:?}: {}. Treating as absent.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str(&contents) {
            Ok(doc) => {
                tracing::debug!("Loaded document '{}' from {:?}", key, path);
                Ok(Some(doc))
            }
            Err(e) => {
                tracing::warn!("Failed to parse {:?}: {}. Treating as absent.", path, e);
                Ok(None)
            }
        }
    }

    /// Save a document with exclusive locking.
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn save(&self, key: &str, doc: &serde_json::Value) -> Result<()> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(doc)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path)
            .map_err(|e| crate::Error::Io(e.error))?;

        tracing::debug!("Saved document '{}' to {:?}", key, path);
        Ok(())
    }
}

/// In-memory store for tests and fully offline operation
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RefCell<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.docs.borrow().get(key).cloned())
    }

    fn save(&self, key: &str, doc: &serde_json::Value) -> Result<()> {
        self.docs.borrow_mut().insert(key.to_string(), doc.clone());
        Ok(())
    }
}

/// Typed load helper: deserialize the document under `key` into `T`,
/// falling back to `T::default()` when absent or malformed
pub fn load_or_default<T>(store: &dyn StateStore, key: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match store.load(key)? {
        Some(doc) => match serde_json::from_value(doc) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Document '{}' has unexpected shape: {}. Using defaults.", key, e);
                Ok(T::default())
            }
        },
        None => Ok(T::default()),
    }
}

/// Typed save helper: serialize `value` and persist it under `key`
pub fn save_document<T>(store: &dyn StateStore, key: &str, value: &T) -> Result<()>
where
    T: serde::Serialize,
{
    store.save(key, &serde_json::to_value(value)?)
}

/// Best-effort mirror write: failures are logged, never surfaced.
///
/// Used for the optional remote/secondary store; a failed mirror write
/// must not roll back local state or block the caller.
pub fn mirror_document(store: &dyn StateStore, key: &str, doc: &serde_json::Value) {
    if let Err(e) = store.save(key, doc) {
        tracing::warn!("Mirror write of '{}' failed: {}", key, e);
    }
}
