//! HTTP handler for `POST /upload`.
//!
//! Streams the multipart field straight into the library without buffering
//! the payload in memory. Responses on this route are always small HTML
//! fragments (success and failure alike), matching what a browser form
//! submission expects.

use crate::{
    errors::AppError,
    services::library_service::{LibraryError, MediaLibrary},
};
use axum::{
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use std::io;

/// The single form field uploads must arrive under.
pub const UPLOAD_FIELD: &str = "audioFile";

/// `POST /upload` — accept exactly one audio file under `audioFile`.
///
/// Validation order: the multipart body must parse (transport and oversize
/// errors surface here), a file part must exist under the expected field,
/// and the extension must be allow-listed. Only then is the payload
/// streamed to disk and renamed into the upload directory.
pub async fn upload(State(library): State<MediaLibrary>, mut multipart: Multipart) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => {
                return failure_for(LibraryError::NoFileUploaded);
            }
            Err(err) => {
                tracing::debug!("multipart parse failed: {}", err);
                return failure_fragment(StatusCode::BAD_REQUEST, &err.to_string());
            }
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        // A text field under the same name carries no filename; treat it
        // like a missing file rather than an unsupported format.
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let stream =
            field.map(|chunk| chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));

        return match library.store_stream(&original_name, stream).await {
            Ok(stored) => {
                tracing::info!("accepted upload `{}` as `{}`", original_name, stored.name);
                success_fragment(&stored.name)
            }
            Err(err) => {
                tracing::warn!("upload of `{}` failed: {}", original_name, err);
                failure_for(err)
            }
        };
    }
}

/// Success page: stored filename plus links back home and to the file.
fn success_fragment(stored_name: &str) -> Response {
    let name = html_escape(stored_name);
    let body = format!(
        concat!(
            "<p>File uploaded successfully.</p>\n",
            "<p>File name: {name}</p>\n",
            "<a href=\"/\">Upload another file</a>\n",
            "<br>\n",
            "<a href=\"/uploads/{name}\">Access the uploaded file</a>\n",
        ),
        name = name
    );
    html_response(StatusCode::OK, &body)
}

fn failure_for(err: LibraryError) -> Response {
    let app_err = AppError::from(err);
    failure_fragment(app_err.status, &app_err.message)
}

/// Failure page: the message and a link back to the form.
fn failure_fragment(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<p>Error: {}</p>\n<a href=\"/\">Go back</a>\n",
        html_escape(message)
    );
    html_response(status, &body)
}

fn html_response(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body.to_string(),
    )
        .into_response()
}

pub(crate) fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
