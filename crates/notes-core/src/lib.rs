//! Notes Core Library
//!
//! This crate provides the core functionality for the notes API: the note
//! model, body validation, and the file-backed note store.
//!
//! # Architecture
//!
//! - **JSON file**: Source of truth, one pretty-printed array of notes
//! - **Write gate**: Serializes every read-modify-write inside the process
//!
//! # Quick Start
//!
//! ```text
//! let store = NoteStore::open("notes.json").await?;
//!
//! // Add a note
//! let input = validate_note(&json!({"title": "Groceries"}))?;
//! let note = store.create(input).await?;
//!
//! // Query notes
//! let notes = store.list().await?;
//! ```
//!
//! # Modules
//!
//! - `store`: Note store (main entry point)
//! - `models`: Note and the request shapes that mutate it
//! - `validation`: Field-level validation of request bodies
//! - `storage`: JSON file persistence and storage errors
//! - `config`: Application configuration

pub mod config;
pub mod models;
pub mod storage;
pub mod store;
pub mod validation;

pub use config::Config;
pub use models::{Note, NoteInput, NotePatch, Priority};
pub use storage::{JsonFilePersistence, StorageError, StorageResult};
pub use store::NoteStore;
pub use validation::{validate_note, validate_patch, FieldError, ValidationErrors};
