//! Request body decoding
//!
//! A push-driven JSON decoder with a hard size ceiling. The caller feeds
//! chunks as they arrive; the decoder fails as soon as the ceiling is
//! crossed and never buffers past it. `finish` consumes the decoder, so it
//! resolves exactly once.

use axum::body::Bytes;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

/// Largest accepted request body (1 MiB)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Reasons a body could not be decoded
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Content-Type must be application/json (got {})", .0.as_deref().unwrap_or("none"))]
    UnsupportedMediaType(Option<String>),

    #[error("Request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Invalid JSON: {0}")]
    MalformedBody(String),

    #[error("Failed to read request body: {0}")]
    TransportError(String),
}

/// Accumulates body chunks up to a byte limit
#[derive(Debug)]
pub struct BodyDecoder {
    buffer: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl BodyDecoder {
    /// Start a decoder for a request with the given Content-Type header
    pub fn for_content_type(content_type: Option<&str>) -> Result<Self, DecodeError> {
        Self::with_limit(content_type, MAX_BODY_BYTES)
    }

    /// Start a decoder with a custom limit
    pub fn with_limit(content_type: Option<&str>, limit: usize) -> Result<Self, DecodeError> {
        if !content_type.is_some_and(is_json_media_type) {
            return Err(DecodeError::UnsupportedMediaType(
                content_type.map(str::to_string),
            ));
        }

        Ok(Self {
            buffer: Vec::new(),
            limit,
            overflowed: false,
        })
    }

    /// Reject up front if the declared Content-Length is already too big
    pub fn expect_length(&mut self, declared: u64) -> Result<(), DecodeError> {
        if declared > self.limit as u64 {
            self.overflowed = true;
            return Err(DecodeError::PayloadTooLarge { limit: self.limit });
        }
        self.buffer.reserve(declared as usize);
        Ok(())
    }

    /// Bytes accepted so far
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Append a chunk
    ///
    /// Fails once the total would pass the limit. The buffer is released at
    /// that point and every later push fails too.
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), DecodeError> {
        if self.overflowed || self.buffer.len() + chunk.len() > self.limit {
            self.overflowed = true;
            self.buffer = Vec::new();
            return Err(DecodeError::PayloadTooLarge { limit: self.limit });
        }

        self.buffer.extend_from_slice(chunk);
        Ok(())
    }

    /// Parse everything received
    pub fn finish(self) -> Result<Value, DecodeError> {
        if self.overflowed {
            return Err(DecodeError::PayloadTooLarge { limit: self.limit });
        }
        if self.is_empty() {
            return Err(DecodeError::MalformedBody("request body is empty".to_string()));
        }

        serde_json::from_slice(&self.buffer)
            .map_err(|e| DecodeError::MalformedBody(e.to_string()))
    }
}

/// Drive a decoder from a stream of body chunks
///
/// Stops pulling from the stream at the first failure.
pub async fn decode_stream<S, E>(
    mut decoder: BodyDecoder,
    stream: S,
) -> Result<Value, DecodeError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::TransportError(e.to_string()))?;
        decoder.push(&chunk)?;
    }

    trace!("Request body complete ({} bytes)", decoder.len());
    decoder.finish()
}

/// `application/json` or any `+json` type; parameters are ignored
fn is_json_media_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}
