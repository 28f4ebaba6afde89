//! File I/O utilities with atomic writes
//!
//! Every document is rewritten whole: serialized to a sibling temp file,
//! synced, then renamed over the original. Writers from separate processes
//! serialize on an advisory lock held on a sibling `.lock` file.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::SpendwiseError;

fn storage_err(action: &str, path: &Path, e: impl std::fmt::Display) -> SpendwiseError {
    SpendwiseError::Storage(format!("Failed to {} {}: {}", action, path.display(), e))
}

fn parse_file<T: DeserializeOwned>(path: &Path) -> Result<T, SpendwiseError> {
    let file = File::open(path).map_err(|e| storage_err("open", path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_err("parse", path, e))
}

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, SpendwiseError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = %path.display(), "document missing, using defaults");
        return Ok(T::default());
    }
    parse_file(path)
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// The target is either the complete new document or left untouched.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), SpendwiseError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_err("create directory", parent, e))?;
    }

    // Same directory as the target so the rename never crosses filesystems
    let temp_path = path.with_extension("json.tmp");

    let result = (|| {
        let file = File::create(&temp_path).map_err(|e| storage_err("create", &temp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, data)
            .map_err(|e| storage_err("serialize", path, e))?;
        writer.flush().map_err(|e| storage_err("flush", &temp_path, e))?;
        writer
            .get_ref()
            .sync_all()
            .map_err(|e| storage_err("sync", &temp_path, e))?;
        fs::rename(&temp_path, path).map_err(|e| storage_err("replace", path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    } else {
        debug!(path = %path.display(), "document written");
    }
    result
}

/// Exclusive advisory lock on a document, released on drop
///
/// The lock lives on `<document>.lock` rather than on the document itself,
/// since an atomic write replaces the document's inode.
#[derive(Debug)]
pub struct DocumentLock {
    file: File,
}

impl DocumentLock {
    /// Block until the lock for `path` is held by this process
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, SpendwiseError> {
        let path = path.as_ref();
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_err("create directory", parent, e))?;
        }

        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| storage_err("open", &lock_path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| storage_err("lock", &lock_path, e))?;

        debug!(path = %lock_path.display(), "document lock acquired");
        Ok(Self { file })
    }
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        name: String,
        entries: Vec<u32>,
    }

    fn doc() -> Doc {
        Doc {
            name: "ledger".to_string(),
            entries: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_read_missing_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded: Doc = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(loaded, Doc::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("doc.json");

        write_json_atomic(&path, &doc()).unwrap();

        let loaded: Doc = read_json(&path).unwrap();
        assert_eq!(loaded, doc());
        assert!(!temp_dir.path().join("nested").join("doc.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");
        fs::write(&path, "not json at all").unwrap();

        let err = read_json::<Doc, _>(&path).unwrap_err();
        assert!(matches!(err, SpendwiseError::Storage(_)));
    }

    #[test]
    fn test_document_lock_is_exclusive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.json");

        let held = DocumentLock::acquire(&path).unwrap();
        assert!(temp_dir.path().join("doc.lock").exists());

        let other = File::open(temp_dir.path().join("doc.lock")).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());

        drop(held);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
        FileExt::unlock(&other).unwrap();
    }
}
