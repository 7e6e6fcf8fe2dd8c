//! audio-host — a minimal audio-file hosting service.
//!
//! Accepts a single audio upload over multipart HTTP, stores it on local
//! disk under a timestamp-prefixed name, and lists/serves stored files back
//! to a browser. The upload directory is the only store of truth; there is
//! no database and no in-memory index.

use axum::Router;

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::library_service::MediaLibrary;

/// Build the application router with its shared state attached.
pub fn create_app(library: MediaLibrary, max_upload_bytes: usize) -> Router {
    routes::routes::routes(max_upload_bytes).with_state(library)
}
