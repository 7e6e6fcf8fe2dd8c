//! Extension allow-list and content-type tables.
//!
//! The audio table does double duty: it decides which uploads are accepted
//! and which `Content-Type` header a stored file is served with. The static
//! table only matters when serving assets out of the public directory.

/// Accepted audio extensions and the content-type each is served with.
///
/// Keys are lowercase and include the leading dot. The client-declared MIME
/// type is never consulted; the extension is authoritative.
const AUDIO_TYPES: &[(&str, &str)] = &[
    (".mp3", "audio/mpeg"),
    (".wav", "audio/wav"),
    (".ogg", "audio/ogg"),
    (".m4a", "audio/mp4"),
    (".flac", "audio/flac"),
];

/// Content-types for common public assets (landing page, stylesheets).
const STATIC_TYPES: &[(&str, &str)] = &[
    (".html", "text/html; charset=utf-8"),
    (".css", "text/css"),
    (".js", "text/javascript"),
    (".json", "application/json"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".svg", "image/svg+xml"),
    (".ico", "image/x-icon"),
    (".txt", "text/plain; charset=utf-8"),
];

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extract the dotted extension of `name`, lowercased.
///
/// Returns `None` when there is no dot or the name ends with one.
pub fn extension_of(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    let ext = &name[idx..];
    if ext.len() < 2 {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// True when `name` carries an extension from the audio allow-list.
pub fn is_allowed_audio(name: &str) -> bool {
    audio_content_type(name).is_some()
}

/// Look up the audio content-type for `name` by extension.
pub fn audio_content_type(name: &str) -> Option<&'static str> {
    let ext = extension_of(name)?;
    AUDIO_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
}

/// Content-type used when serving a file, falling back to a generic
/// binary type for anything the tables do not know.
pub fn serve_content_type(name: &str) -> &'static str {
    if let Some(mime) = audio_content_type(name) {
        return mime;
    }
    let Some(ext) = extension_of(name) else {
        return OCTET_STREAM;
    };
    STATIC_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(OCTET_STREAM)
}
