//! JSON file persistence
//!
//! Loads and saves the whole note collection as one pretty-printed JSON
//! array. Uses atomic writes (write to temp file, then rename) so a reader
//! never sees a partially-written file.
//!
//! A missing file is an empty collection.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::error::{StorageError, StorageResult};
use crate::models::Note;

/// Persistence layer for the notes file
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    /// Create a new persistence handler for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every note from disk
    ///
    /// Returns an empty collection if the file doesn't exist.
    /// Returns an error if the file exists but can't be read or parsed.
    pub async fn load(&self) -> StorageResult<Vec<Note>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_read(e, self.path.clone())),
        };

        serde_json::from_slice(&bytes).map_err(|e| StorageError::InvalidFormat {
            path: self.path.clone(),
            details: e.to_string(),
        })
    }

    /// Replace the file contents with the given notes
    pub async fn save(&self, notes: &[Note]) -> StorageResult<()> {
        let mut bytes = serde_json::to_vec_pretty(notes)?;
        bytes.push(b'\n');
        atomic_write(&self.path, &bytes).await
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    // Same directory as the target, so the rename stays on one filesystem
    let temp_path = temp_path_for(path);

    let mut file = File::create(&temp_path)
        .await
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.write_all(data)
        .await
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::from_write(e, temp_path.clone()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .await
        .map_err(|source| StorageError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source,
        })?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "notes.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
