//! Note store
//!
//! The `NoteStore` owns the authoritative note collection and its file on
//! disk. Every mutation is a whole-file read-modify-write:
//!
//! 1. take the write gate
//! 2. load the full collection from disk
//! 3. apply the change in memory
//! 4. write the full collection back (atomic rename)
//!
//! ## Single writer
//!
//! The write gate serializes mutations within this process, so two
//! concurrent updates of the same note cannot lose each other's changes.
//! Nothing coordinates with other processes writing the same file.
//!
//! Reads skip the gate; the atomic rename means they observe either the
//! previous or the next complete collection.
//!
//! ## Usage
//!
//! ```ignore
//! let store = NoteStore::open("notes.json").await?;
//!
//! let note = store.create(NoteInput::new("Groceries")).await?;
//! let found = store.get(note.id).await?;
//! ```

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Note, NoteInput, NotePatch};
use crate::storage::{JsonFilePersistence, StorageResult};

/// File-backed note collection
pub struct NoteStore {
    persistence: JsonFilePersistence,
    /// Held for the whole of every read-modify-write
    write_gate: Mutex<()>,
}

impl NoteStore {
    /// Open the store backed by the given file
    ///
    /// The file is loaded once so that a corrupt collection is reported at
    /// startup rather than on the first request.
    pub async fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let persistence = JsonFilePersistence::new(path);
        let notes = persistence.load().await?;

        info!(
            "Opened note store at {:?} ({} notes)",
            persistence.path(),
            notes.len()
        );

        Ok(Self {
            persistence,
            write_gate: Mutex::new(()),
        })
    }

    /// Open the store at the configured data file
    pub async fn open_with_config(config: &Config) -> StorageResult<Self> {
        Self::open(config.data_file.clone()).await
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.persistence.path()
    }

    // ==================== Queries ====================

    /// Get all notes, in insertion order
    pub async fn list(&self) -> StorageResult<Vec<Note>> {
        self.persistence.load().await
    }

    /// Get notes carrying a tag (case-insensitive)
    pub async fn list_tagged(&self, tag: &str) -> StorageResult<Vec<Note>> {
        let mut notes = self.persistence.load().await?;
        notes.retain(|note| note.has_tag(tag));
        Ok(notes)
    }

    /// Get a note by ID
    pub async fn get(&self, id: Uuid) -> StorageResult<Option<Note>> {
        let notes = self.persistence.load().await?;
        Ok(notes.into_iter().find(|note| note.id == id))
    }

    /// Get count of notes
    pub async fn count(&self) -> StorageResult<usize> {
        Ok(self.persistence.load().await?.len())
    }

    // ==================== Mutations ====================

    /// Add a new note, assigning a fresh ID
    pub async fn create(&self, input: NoteInput) -> StorageResult<Note> {
        let _guard = self.write_gate.lock().await;
        let mut notes = self.persistence.load().await?;

        let mut id = Uuid::new_v4();
        while notes.iter().any(|note| note.id == id) {
            id = Uuid::new_v4();
        }

        let note = Note::with_id(id, input);
        notes.push(note.clone());
        self.persistence.save(&notes).await?;

        debug!("Created note {}", note.id);
        Ok(note)
    }

    /// Overwrite every field of a note except its ID and creation time
    ///
    /// Returns `None` if no note has this ID.
    pub async fn replace(&self, id: Uuid, input: NoteInput) -> StorageResult<Option<Note>> {
        self.update_with(id, |note| note.replace(input)).await
    }

    /// Shallow-merge a patch onto a note
    ///
    /// Returns `None` if no note has this ID.
    pub async fn merge(&self, id: Uuid, patch: NotePatch) -> StorageResult<Option<Note>> {
        self.update_with(id, |note| note.merge(patch)).await
    }

    /// Delete a note
    ///
    /// Returns `false` (and writes nothing) if no note has this ID.
    pub async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let _guard = self.write_gate.lock().await;
        let mut notes = self.persistence.load().await?;

        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Ok(false);
        }

        self.persistence.save(&notes).await?;
        debug!("Deleted note {}", id);
        Ok(true)
    }

    async fn update_with<F>(&self, id: Uuid, apply: F) -> StorageResult<Option<Note>>
    where
        F: FnOnce(&mut Note),
    {
        let _guard = self.write_gate.lock().await;
        let mut notes = self.persistence.load().await?;

        let Some(note) = notes.iter_mut().find(|note| note.id == id) else {
            return Ok(None);
        };
        apply(note);
        let updated = note.clone();

        self.persistence.save(&notes).await?;
        debug!("Updated note {}", id);
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::storage::StorageError;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn test_store(temp_dir: &TempDir) -> NoteStore {
        NoteStore::open(temp_dir.path().join("notes.json"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        assert!(store.list().await.unwrap().is_empty());
        // Opening does not create the file; the first mutation does
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_open_rejects_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        std::fs::write(&path, "[{\"title\": ").unwrap();

        let result = NoteStore::open(&path).await;
        assert!(matches!(result, Err(StorageError::InvalidFormat { .. })));
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        let created = store
            .create(NoteInput::new("Groceries").with_content("Milk"))
            .await
            .unwrap();

        let retrieved = store.get(created.id).await.unwrap().unwrap();
        assert_eq!(retrieved, created);
        assert_eq!(retrieved.title, "Groceries");
        assert_eq!(retrieved.content.as_deref(), Some("Milk"));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        let created = {
            let store = test_store(&temp_dir).await;
            store.create(NoteInput::new("Persistent")).await.unwrap()
        };

        let store = test_store(&temp_dir).await;
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(created.id).await.unwrap().unwrap(), created);
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        for title in ["one", "two", "three"] {
            store.create(NoteInput::new(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        let mut ids = HashSet::new();
        for i in 0..25 {
            let note = store
                .create(NoteInput::new(format!("note {}", i)))
                .await
                .unwrap();
            assert!(ids.insert(note.id));
        }
        assert_eq!(store.count().await.unwrap(), 25);
    }

    #[tokio::test]
    async fn test_replace_discards_old_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        let original = store
            .create(
                NoteInput::new("A")
                    .with_content("B")
                    .with_tags(vec!["x".to_string()]),
            )
            .await
            .unwrap();

        let replaced = store
            .replace(original.id, NoteInput::new("C"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.created_at, original.created_at);
        assert_eq!(replaced.title, "C");
        assert!(replaced.content.is_none());
        assert!(replaced.tags.is_empty());
        assert!(replaced.updated_at >= original.updated_at);
        assert_eq!(store.get(original.id).await.unwrap().unwrap(), replaced);
    }

    #[tokio::test]
    async fn test_merge_keeps_unspecified_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        let original = store
            .create(NoteInput::new("A").with_content("B"))
            .await
            .unwrap();

        let merged = store
            .merge(
                original.id,
                NotePatch {
                    title: Some("C".to_string()),
                    priority: Some(Priority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(merged.title, "C");
        assert_eq!(merged.content.as_deref(), Some("B"));
        assert_eq!(merged.priority, Priority::High);
        assert_eq!(merged.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_mutating_missing_note_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;
        store.create(NoteInput::new("Existing")).await.unwrap();

        let missing = Uuid::new_v4();
        assert!(store
            .replace(missing, NoteInput::new("X"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .merge(missing, NotePatch::default())
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_final() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        let note = store.create(NoteInput::new("Doomed")).await.unwrap();

        assert!(store.delete(note.id).await.unwrap());
        assert!(store.get(note.id).await.unwrap().is_none());
        assert!(!store.delete(note.id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_list_tagged() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir).await;

        store
            .create(NoteInput::new("Work item").with_tags(vec!["Work".to_string()]))
            .await
            .unwrap();
        store
            .create(NoteInput::new("Chores").with_tags(vec!["home".to_string()]))
            .await
            .unwrap();

        let work = store.list_tagged("work").await.unwrap();
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].title, "Work item");
        assert!(store.list_tagged("garden").await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_lose_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(test_store(&temp_dir).await);

        let note = store.create(NoteInput::new("Shared")).await.unwrap();

        // Interleaved read-modify-write cycles would drop notes without the gate
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(NoteInput::new(format!("extra {}", i))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 11);
        assert!(store.get(note.id).await.unwrap().is_some());
    }
}
