//! Represents a file accepted into the upload directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored upload, reconstructed from its directory entry.
///
/// The stored name is server-generated (`<unix-millis>-<original-basename>`)
/// and is the only key the system has; the record stores metadata, not the
/// content bytes.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredFile {
    /// Stored filename, unique within the upload directory.
    pub name: String,

    /// Size in bytes.
    pub size_bytes: u64,

    /// Content type derived from the extension table, if known.
    pub content_type: Option<String>,

    /// Last-modified timestamp from the filesystem.
    pub last_modified: DateTime<Utc>,
}
