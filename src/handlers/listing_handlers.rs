//! Listing handlers: the JSON file list and the HTML landing page.
//!
//! Both re-read the upload directory on every request; the directory is
//! the source of truth and nothing is cached. A listing may race with an
//! in-flight rename and include or miss that file, which is acceptable.

use crate::{
    errors::AppError,
    handlers::upload_handlers::{UPLOAD_FIELD, html_escape},
    services::library_service::MediaLibrary,
};
use axum::{Json, extract::State, response::Html};

/// `GET /file-list` — JSON array of stored filenames.
///
/// A directory read failure is a 500 here: the listing is the service's
/// index, and "unavailable" is more honest than "empty". (The lenient
/// empty-page behavior is reserved for the HTML landing page.)
pub async fn file_list(
    State(library): State<MediaLibrary>,
) -> Result<Json<Vec<String>>, AppError> {
    let files = library.list_files().await?;
    Ok(Json(files.into_iter().map(|f| f.name).collect()))
}

/// `GET /` and `GET /index.html` — upload form plus the current library.
///
/// Renders each stored file as a list item with an inline audio player.
/// If the directory cannot be read the page still renders, just with an
/// empty list.
pub async fn index(State(library): State<MediaLibrary>) -> Html<String> {
    let files = library.list_files().await.unwrap_or_default();

    let mut page = String::from(concat!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n",
        "<meta charset=\"utf-8\">\n",
        "<title>Audio Host</title>\n",
        "<link rel=\"stylesheet\" href=\"/public/style.css\">\n",
        "</head>\n<body>\n",
        "<h1>Audio Host</h1>\n",
        "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n",
    ));
    page.push_str(&format!(
        "<input type=\"file\" name=\"{}\" accept=\"audio/*\">\n",
        UPLOAD_FIELD
    ));
    page.push_str("<button type=\"submit\">Upload</button>\n</form>\n");

    if files.is_empty() {
        page.push_str("<p>No files uploaded yet.</p>\n");
    } else {
        page.push_str("<h2>Uploaded files</h2>\n<ul>\n");
        for file in &files {
            let name = html_escape(&file.name);
            page.push_str(&format!(
                concat!(
                    "<li>\n",
                    "<audio controls src=\"/uploads/{name}\"></audio>\n",
                    "<a href=\"/uploads/{name}\">{name}</a>\n",
                    "</li>\n",
                ),
                name = name
            ));
        }
        page.push_str("</ul>\n");
    }

    page.push_str("</body>\n</html>\n");
    Html(page)
}
