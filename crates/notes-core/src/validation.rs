//! Note body validation
//!
//! Turns an untyped JSON value into a `NoteInput` (full body) or a
//! `NotePatch` (partial body). Unlike plain deserialization, every field is
//! checked and all problems are reported together as `(field, message)`
//! pairs.
//!
//! # Rules
//! - The body must be a JSON object
//! - `title`: string, non-empty after trimming (required for full bodies)
//! - `content`: string or null
//! - `tags`: array of non-empty strings; duplicates (ignoring ASCII case)
//!   are collapsed, keeping the first spelling
//! - `isArchived`: boolean
//! - `priority`: one of `low`, `medium`, `high`
//!
//! Server-managed keys (`id`, `createdAt`, `updatedAt`) and unknown keys are
//! ignored.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{NoteInput, NotePatch, Priority};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_TAG_LENGTH: usize = 50;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All field errors found in one body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} invalid field(s): {}", .0.len(), join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a full note body (create / replace)
pub fn validate_note(value: &Value) -> Result<NoteInput, ValidationErrors> {
    let object = expect_object(value)?;
    let mut errors = Vec::new();

    let title = match object.get("title") {
        None | Some(Value::Null) => {
            errors.push(FieldError::new("title", "title is required"));
            None
        }
        Some(v) => check_title(v, &mut errors),
    };
    let content = object
        .get("content")
        .and_then(|v| check_content(v, &mut errors))
        .flatten();
    let tags = object
        .get("tags")
        .and_then(|v| check_tags(v, &mut errors))
        .unwrap_or_default();
    let is_archived = object
        .get("isArchived")
        .and_then(|v| check_bool("isArchived", v, &mut errors))
        .unwrap_or(false);
    let priority = object
        .get("priority")
        .and_then(|v| check_priority(v, &mut errors))
        .unwrap_or_default();

    match title {
        Some(title) if errors.is_empty() => Ok(NoteInput {
            title,
            content,
            tags,
            is_archived,
            priority,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validate a partial note body (merge)
pub fn validate_patch(value: &Value) -> Result<NotePatch, ValidationErrors> {
    let object = expect_object(value)?;
    let mut errors = Vec::new();

    let patch = NotePatch {
        title: object
            .get("title")
            .and_then(|v| check_title(v, &mut errors)),
        content: object
            .get("content")
            .and_then(|v| check_content(v, &mut errors)),
        tags: object.get("tags").and_then(|v| check_tags(v, &mut errors)),
        is_archived: object
            .get("isArchived")
            .and_then(|v| check_bool("isArchived", v, &mut errors)),
        priority: object
            .get("priority")
            .and_then(|v| check_priority(v, &mut errors)),
    };

    if errors.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn expect_object(value: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    value.as_object().ok_or_else(|| {
        ValidationErrors(vec![FieldError::new(
            "body",
            format!("expected a JSON object, got {}", type_name(value)),
        )])
    })
}

fn check_title(value: &Value, errors: &mut Vec<FieldError>) -> Option<String> {
    let Some(title) = value.as_str() else {
        errors.push(FieldError::new(
            "title",
            format!("expected a string, got {}", type_name(value)),
        ));
        return None;
    };

    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "title must not be empty"));
        return None;
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        errors.push(FieldError::new(
            "title",
            format!("title must be at most {} characters", MAX_TITLE_LENGTH),
        ));
        return None;
    }

    Some(title.to_string())
}

/// `Some(None)` means an explicit null
fn check_content(value: &Value, errors: &mut Vec<FieldError>) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::String(s) => Some(Some(s.clone())),
        other => {
            errors.push(FieldError::new(
                "content",
                format!("expected a string or null, got {}", type_name(other)),
            ));
            None
        }
    }
}

fn check_tags(value: &Value, errors: &mut Vec<FieldError>) -> Option<Vec<String>> {
    let Some(items) = value.as_array() else {
        errors.push(FieldError::new(
            "tags",
            format!("expected an array of strings, got {}", type_name(value)),
        ));
        return None;
    };

    let before = errors.len();
    let mut tags: Vec<String> = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let field = format!("tags[{}]", index);
        match item.as_str() {
            Some(tag) if tag.trim().is_empty() => {
                errors.push(FieldError::new(field, "tag must not be empty"));
            }
            Some(tag) if tag.chars().count() > MAX_TAG_LENGTH => {
                errors.push(FieldError::new(
                    field,
                    format!("tag must be at most {} characters", MAX_TAG_LENGTH),
                ));
            }
            Some(tag) => {
                // Same rule as `Note::has_tag`, so the filter sees distinct tags
                if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                    tags.push(tag.to_string());
                }
            }
            None => {
                errors.push(FieldError::new(
                    field,
                    format!("expected a string, got {}", type_name(item)),
                ));
            }
        }
    }

    (errors.len() == before).then_some(tags)
}

fn check_bool(field: &str, value: &Value, errors: &mut Vec<FieldError>) -> Option<bool> {
    let parsed = value.as_bool();
    if parsed.is_none() {
        errors.push(FieldError::new(
            field,
            format!("expected a boolean, got {}", type_name(value)),
        ));
    }
    parsed
}

fn check_priority(value: &Value, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let parsed = value.as_str().and_then(Priority::parse);
    if parsed.is_none() {
        errors.push(FieldError::new(
            "priority",
            "expected one of \"low\", \"medium\", \"high\"",
        ));
    }
    parsed
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn has_field(err: &ValidationErrors, field: &str) -> bool {
        err.errors().iter().any(|e| e.field == field)
    }

    #[test]
    fn test_minimal_note_gets_defaults() {
        let input = validate_note(&json!({"title": "Groceries"})).unwrap();
        assert_eq!(input, NoteInput::new("Groceries"));
    }

    #[test]
    fn test_full_note() {
        let input = validate_note(&json!({
            "title": "Groceries",
            "content": "Milk",
            "tags": ["home", "errands"],
            "isArchived": true,
            "priority": "high"
        }))
        .unwrap();

        assert_eq!(input.title, "Groceries");
        assert_eq!(input.content.as_deref(), Some("Milk"));
        assert_eq!(input.tags, vec!["home", "errands"]);
        assert!(input.is_archived);
        assert_eq!(input.priority, Priority::High);
    }

    #[test]
    fn test_missing_title() {
        let err = validate_note(&json!({"content": "Milk"})).unwrap_err();
        assert!(has_field(&err, "title"));
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn test_blank_title() {
        let err = validate_note(&json!({"title": "   "})).unwrap_err();
        assert!(has_field(&err, "title"));
    }

    #[test]
    fn test_overlong_title() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        let err = validate_note(&json!({ "title": title })).unwrap_err();
        assert!(has_field(&err, "title"));
    }

    #[test]
    fn test_reports_every_bad_field() {
        let err = validate_note(&json!({
            "title": 42,
            "content": ["not", "a", "string"],
            "tags": ["ok", "", 7],
            "isArchived": "yes",
            "priority": "urgent"
        }))
        .unwrap_err();

        assert!(has_field(&err, "title"));
        assert!(has_field(&err, "content"));
        assert!(has_field(&err, "tags[1]"));
        assert!(has_field(&err, "tags[2]"));
        assert!(has_field(&err, "isArchived"));
        assert!(has_field(&err, "priority"));
        assert_eq!(err.errors().len(), 6);
    }

    #[test]
    fn test_non_object_body() {
        let err = validate_note(&json!(["title"])).unwrap_err();
        assert!(has_field(&err, "body"));
        assert!(err.to_string().contains("array"));

        let err = validate_patch(&json!("title")).unwrap_err();
        assert!(has_field(&err, "body"));
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let input =
            validate_note(&json!({"title": "A", "tags": ["a", "b", "a", "c", "b"]})).unwrap();
        assert_eq!(input.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_tags_ignore_case() {
        let input =
            validate_note(&json!({"title": "A", "tags": ["Work", "work", "WORK", "home"]}))
                .unwrap();
        assert_eq!(input.tags, vec!["Work", "home"]);

        let patch = validate_patch(&json!({"tags": ["home", "Home"]})).unwrap();
        assert_eq!(patch.tags, Some(vec!["home".to_string()]));
    }

    #[test]
    fn test_server_managed_and_unknown_keys_ignored() {
        let input = validate_note(&json!({
            "id": "not-yours",
            "createdAt": "yesterday",
            "title": "A",
            "color": "blue"
        }))
        .unwrap();
        assert_eq!(input, NoteInput::new("A"));
    }

    #[test]
    fn test_null_content_means_absent() {
        let input = validate_note(&json!({"title": "A", "content": null})).unwrap();
        assert!(input.content.is_none());
    }

    #[test]
    fn test_empty_patch() {
        let patch = validate_patch(&json!({})).unwrap();
        assert_eq!(patch, NotePatch::default());
    }

    #[test]
    fn test_patch_only_sets_present_fields() {
        let patch = validate_patch(&json!({"content": "Milk, eggs"})).unwrap();
        assert_eq!(patch.content, Some(Some("Milk, eggs".to_string())));
        assert!(patch.title.is_none());
        assert!(patch.tags.is_none());
    }

    #[test]
    fn test_patch_null_content_clears() {
        let patch = validate_patch(&json!({"content": null})).unwrap();
        assert_eq!(patch.content, Some(None));
    }

    #[test]
    fn test_patch_rejects_blank_title() {
        let err = validate_patch(&json!({"title": ""})).unwrap_err();
        assert!(has_field(&err, "title"));
    }

    #[test]
    fn test_error_display_lists_fields() {
        let err = validate_note(&json!({"priority": 1})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("2 invalid field(s)"));
        assert!(msg.contains("title"));
        assert!(msg.contains("priority"));
    }
}
