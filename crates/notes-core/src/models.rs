//! Data models for the notes API
//!
//! Defines the persisted `Note` plus the two validated request shapes that
//! mutate it: `NoteInput` (full body, used by create and replace) and
//! `NotePatch` (partial body, used by merge).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Note priority
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Parse a priority from its wire name
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A stored note
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, assigned by the store
    pub id: Uuid,
    /// Note title
    pub title: String,
    /// Note body content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tags for organization (no duplicates)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether the note is archived
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub priority: Priority,
    /// When this note was created
    pub created_at: DateTime<Utc>,
    /// When this note was last updated
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Create a new note from validated input
    pub fn new(input: NoteInput) -> Self {
        Self::with_id(Uuid::new_v4(), input)
    }

    /// Create a note with a specific ID
    pub fn with_id(id: Uuid, input: NoteInput) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: input.title,
            content: input.content,
            tags: input.tags,
            is_archived: input.is_archived,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite every field except `id` and `created_at`
    pub fn replace(&mut self, input: NoteInput) {
        self.title = input.title;
        self.content = input.content;
        self.tags = input.tags;
        self.is_archived = input.is_archived;
        self.priority = input.priority;
        self.updated_at = Utc::now();
    }

    /// Shallow-merge a patch: present fields overwrite, absent fields are kept
    pub fn merge(&mut self, patch: NotePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(is_archived) = patch.is_archived {
            self.is_archived = is_archived;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        self.updated_at = Utc::now();
    }

    /// Check for a tag, ignoring ASCII case
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Full note body, as accepted by create (POST) and replace (PUT)
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInput {
    pub title: String,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub is_archived: bool,
    pub priority: Priority,
}

impl NoteInput {
    /// Input with the given title and every other field at its default
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
            tags: Vec::new(),
            is_archived: false,
            priority: Priority::default(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Partial note body, as accepted by merge (PATCH)
///
/// `content` is doubly optional: `None` leaves it alone, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_archived: Option<bool>,
    pub priority: Option<Priority>,
}
