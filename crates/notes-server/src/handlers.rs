//! Request dispatch
//!
//! A single entry point resolves the `Route`, reads and validates the body
//! for mutating routes, calls the store, and turns the outcome (or any
//! `ApiError`) into a response. No handler failure escapes as a panic or a
//! dropped connection.
//!
//! Only the body read runs under the request deadline. Once a store call
//! has started it always runs to completion, so a client never sees a
//! timeout for a write that landed.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, trace};
use uuid::Uuid;

use notes_core::{validate_note, validate_patch, NoteStore};

use crate::body::{decode_stream, BodyDecoder};
use crate::error::{ApiError, ApiResult};
use crate::routes::Route;

/// Default time allowed for receiving a request body
pub const DEFAULT_BODY_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<NoteStore>,
    /// Deadline for receiving a request body
    pub body_timeout: Duration,
}

impl AppState {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store: Arc::new(store),
            body_timeout: DEFAULT_BODY_TIMEOUT,
        }
    }

    pub fn with_body_timeout(mut self, body_timeout: Duration) -> Self {
        self.body_timeout = body_timeout;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    tag: Option<String>,
}

/// Route any request to its handler
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    handle(&state, request)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn handle(state: &AppState, request: Request) -> ApiResult<Response> {
    let (parts, body) = request.into_parts();
    let route = Route::resolve(&parts.method, parts.uri.path());
    trace!("{} {} -> {:?}", parts.method, parts.uri, route);

    // Body problems are reported before the target note is looked up
    let payload = if route.takes_body() {
        read_json(&parts.headers, body, state.body_timeout).await?
    } else {
        Value::Null
    };

    match route {
        Route::ListNotes => list_notes(state, &parts.uri).await,
        Route::CreateNote => create_note(state, &payload).await,
        Route::GetNote(id) => get_note(state, &id).await,
        Route::ReplaceNote(id) => replace_note(state, &id, &payload).await,
        Route::MergeNote(id) => merge_note(state, &id, &payload).await,
        Route::DeleteNote(id) => delete_note(state, &id).await,
        Route::NotFound => Err(ApiError::RouteNotFound),
    }
}

// Route handlers

async fn list_notes(state: &AppState, uri: &Uri) -> ApiResult<Response> {
    let query = Query::<ListQuery>::try_from_uri(uri)
        .map(|Query(q)| q)
        .unwrap_or_default();

    let notes = match query.tag.as_deref().filter(|t| !t.is_empty()) {
        Some(tag) => state.store.list_tagged(tag).await?,
        None => state.store.list().await?,
    };

    Ok(Json(notes).into_response())
}

async fn create_note(state: &AppState, body: &Value) -> ApiResult<Response> {
    let input = validate_note(body)?;
    let note = state.store.create(input).await?;

    info!("Created note {}", note.id);
    Ok((StatusCode::CREATED, Json(note)).into_response())
}

async fn get_note(state: &AppState, id: &str) -> ApiResult<Response> {
    let id = parse_id(id)?;
    let note = state.store.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(note).into_response())
}

async fn replace_note(state: &AppState, id: &str, body: &Value) -> ApiResult<Response> {
    let input = validate_note(body)?;
    let id = parse_id(id)?;

    let note = state
        .store
        .replace(id, input)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(note).into_response())
}

async fn merge_note(state: &AppState, id: &str, body: &Value) -> ApiResult<Response> {
    let patch = validate_patch(body)?;
    let id = parse_id(id)?;

    let note = state
        .store
        .merge(id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(note).into_response())
}

async fn delete_note(state: &AppState, id: &str) -> ApiResult<Response> {
    let id = parse_id(id)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }

    info!("Deleted note {}", id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

// Helpers

/// An ID that is not a UUID cannot name any stored note
fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound)
}

/// Check the content type, then stream the body through a bounded decoder
async fn read_json(headers: &HeaderMap, body: Body, deadline: Duration) -> ApiResult<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let mut decoder = BodyDecoder::for_content_type(content_type)?;

    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(declared) = declared {
        decoder.expect_length(declared)?;
    }

    let stream = body.into_data_stream();
    let decoded = tokio::time::timeout(deadline, decode_stream(decoder, stream))
        .await
        .map_err(|_| ApiError::Timeout(deadline))?;
    Ok(decoded?)
}
