//! Defines routes for the audio hosting service.
//!
//! ## Structure
//! - **Pages**
//!   - `GET  /` and `/index.html` — landing page with upload form and file list
//! - **Uploads**
//!   - `POST /upload` — accept one multipart audio file under `audioFile`
//!   - `GET  /uploads/{filename}` — stream a stored upload
//!   - `GET  /file-list` — JSON array of stored filenames
//! - **Assets & health**
//!   - `GET  /public/{*path}` — stream a static asset
//!   - `GET  /healthz`, `GET /readyz`
//!
//! Unmatched paths fall through to an HTML 404 page; a matched path with
//! the wrong method gets the method router's 405.

use crate::{
    handlers::{
        file_handlers::{not_found, serve_public, serve_upload},
        health_handlers::{healthz, readyz},
        listing_handlers::{file_list, index},
        upload_handlers::upload,
    },
    services::library_service::MediaLibrary,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router for all routes.
///
/// The router carries shared state (`MediaLibrary`) to all handlers.
/// `max_upload_bytes` bounds request bodies; multipart parsing surfaces
/// the limit as a parse error on the upload route.
pub fn routes(max_upload_bytes: usize) -> Router<MediaLibrary> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // pages
        .route("/", get(index))
        .route("/index.html", get(index))
        // upload + library
        .route("/upload", post(upload))
        .route("/file-list", get(file_list))
        .route("/uploads/{filename}", get(serve_upload))
        // static assets
        .route("/public/{*path}", get(serve_public))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
