//! Notes HTTP server
//!
//! Exposes the note store over HTTP/1.1 with JSON bodies.
//!
//! # Modules
//!
//! - `body`: Size-bounded, push-driven JSON body decoder
//! - `routes`: Method + path to `Route` resolution
//! - `handlers`: Dispatch and per-route handlers
//! - `error`: API error kinds and their responses
//! - `server`: Listener, access log, graceful shutdown

pub mod body;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use handlers::AppState;
pub use routes::Route;
pub use server::{create_router, run, serve};
