//! Persistence Layer (C9)
//!
//! JSON snapshot files under a data directory, per §6's layout. Write
//! is atomic (write-temp-then-rename); a read failure falls back to
//! empty in-memory state with a warning — the process never aborts on
//! a corrupt or missing snapshot.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PersistenceError;

pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    pub fn ensure_dirs(&self, subdirs: &[&str]) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        for sub in subdirs {
            std::fs::create_dir_all(Path::new(sub))?;
        }
        Ok(())
    }

    /// Serializes `value` to `<data_dir>/<name>` via a temp file + atomic
    /// rename, so a reader never observes a partially written snapshot.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), PersistenceError> {
        let path = self.path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_vec_pretty(value).map_err(|e| PersistenceError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        std::fs::write(&tmp_path, &json).map_err(|e| PersistenceError::WriteFailed {
            path: tmp_path.display().to_string(),
            reason: e.to_string(),
        })?;

        std::fs::rename(&tmp_path, &path).map_err(|e| PersistenceError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Reads and deserializes `<data_dir>/<name>`. A missing file or a
    /// parse failure both resolve to `None` with a logged warning —
    /// callers restore from this as "start empty", never a process
    /// abort.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.path(name);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "snapshot read failed, starting empty");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "snapshot corrupt, starting empty");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let mut data = HashMap::new();
        data.insert("a".to_string(), 1u32);
        store.write("test.json", &data).unwrap();
        let restored: HashMap<String, u32> = store.read("test.json").unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn read_missing_file_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let restored: Option<HashMap<String, u32>> = store.read("missing.json");
        assert!(restored.is_none());
    }

    #[test]
    fn read_corrupt_file_falls_back_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        std::fs::write(dir.path().join("corrupt.json"), b"not json").unwrap();
        let restored: Option<HashMap<String, u32>> = store.read("corrupt.json");
        assert!(restored.is_none());
    }
}
