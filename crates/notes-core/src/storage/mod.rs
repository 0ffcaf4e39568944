//! Storage layer
//!
//! Handles persistence of the note collection.
//!
//! ## Layout
//!
//! A single JSON file holds the whole collection as a pretty-printed array.
//! It is rewritten wholesale (temp file + rename) on every mutation.

pub mod error;
pub mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::JsonFilePersistence;
