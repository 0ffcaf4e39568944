//! Route table
//!
//! Maps a method and a request path to a `Route`. Paths are percent-decoded
//! and split into non-empty segments, so `/notes`, `/notes/` and `//notes`
//! are the same route.
//!
//! | Path          | Methods                      |
//! |---------------|------------------------------|
//! | `/notes`      | GET, POST                    |
//! | `/notes/{id}` | GET, PUT, PATCH, DELETE      |

use axum::http::Method;

/// Name of the only resource
pub const NOTES_RESOURCE: &str = "notes";

/// A resolved request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListNotes,
    CreateNote,
    GetNote(String),
    ReplaceNote(String),
    MergeNote(String),
    DeleteNote(String),
    NotFound,
}

impl Route {
    /// Resolve a method and path (without query string)
    pub fn resolve(method: &Method, path: &str) -> Self {
        let Some(segments) = path_segments(path) else {
            return Route::NotFound;
        };

        match segments.as_slice() {
            [resource] if resource == NOTES_RESOURCE => match *method {
                Method::GET => Route::ListNotes,
                Method::POST => Route::CreateNote,
                _ => Route::NotFound,
            },
            [resource, id] if resource == NOTES_RESOURCE => {
                let id = id.clone();
                match *method {
                    Method::GET => Route::GetNote(id),
                    Method::PUT => Route::ReplaceNote(id),
                    Method::PATCH => Route::MergeNote(id),
                    Method::DELETE => Route::DeleteNote(id),
                    _ => Route::NotFound,
                }
            }
            _ => Route::NotFound,
        }
    }

    /// Whether this route reads a request body
    pub fn takes_body(&self) -> bool {
        matches!(
            self,
            Route::CreateNote | Route::ReplaceNote(_) | Route::MergeNote(_)
        )
    }
}

/// Percent-decode a path and split it into non-empty segments
///
/// Returns `None` if the decoded path is not valid UTF-8.
pub fn path_segments(path: &str) -> Option<Vec<String>> {
    let path = path.split('?').next().unwrap_or_default();
    let decoded = urlencoding::decode(path).ok()?;

    Some(
        decoded
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
    )
}
