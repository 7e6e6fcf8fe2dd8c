//! File-serving handlers for stored uploads and public assets.
//!
//! Bodies are streamed from disk, never buffered. Requested names are
//! resolved by the library, which rejects anything that could escape the
//! served root before the filesystem is touched.

use crate::{errors::AppError, models::stored_file::StoredFile, services::library_service::MediaLibrary};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::services::media_types::OCTET_STREAM;

/// `GET /uploads/{filename}` — stream a stored upload.
pub async fn serve_upload(
    State(library): State<MediaLibrary>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let (meta, file) = library.open_reader(&filename).await?;
    Ok(stream_file_response(&meta, file))
}

/// `GET /public/{*path}` — stream a static asset.
pub async fn serve_public(
    State(library): State<MediaLibrary>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let (meta, file) = library.open_public(&path).await?;
    Ok(stream_file_response(&meta, file))
}

/// Fallback for unmatched routes: a small HTML 404 page.
pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!("no route for {}", uri.path());
    let body = concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
        "<meta charset=\"utf-8\">\n<title>Not Found</title>\n</head>\n<body>\n",
        "<h1>404 — Not Found</h1>\n",
        "<a href=\"/\">Back to Audio Host</a>\n",
        "</body>\n</html>\n",
    );
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}

fn stream_file_response(meta: &StoredFile, file: File) -> Response {
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let content_type = meta.content_type.as_deref().unwrap_or(OCTET_STREAM);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM)),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size_bytes.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    headers.insert(
        header::LAST_MODIFIED,
        HeaderValue::from_str(&meta.last_modified.to_rfc2822())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );

    response
}
