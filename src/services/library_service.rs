//! src/services/library_service.rs
//!
//! MediaLibrary — the storage core behind every handler. Payloads live on
//! local disk only; there is no metadata store. The upload directory itself
//! is the index, so listings and reads always re-scan the filesystem.
//! Handlers never touch paths directly: every name coming off the wire goes
//! through this module's sanitizers first.

use crate::models::stored_file::StoredFile;
use crate::services::media_types;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io::{self, ErrorKind},
    path::{Component, Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("No file uploaded")]
    NoFileUploaded,
    #[error("Unsupported format `{0}`: only audio files are allowed")]
    UnsupportedFormat(String),
    #[error("invalid file name")]
    InvalidFileName,
    #[error("file `{0}` not found")]
    FileNotFound(String),
    #[error("upload stream failed: {0}")]
    Stream(io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

const MAX_FILE_NAME_LEN: usize = 255;

/// MediaLibrary provides the operations the routes are built from:
/// - Store an upload (stream bytes to a temp file, then rename into place)
/// - Open a stored file for streaming out
/// - List the upload directory
/// - Resolve public asset paths
///
/// The struct is cheap to clone and carries no open handles, so it doubles
/// as the router state.
#[derive(Clone)]
pub struct MediaLibrary {
    /// Directory holding accepted uploads. Flat; doubles as the index.
    pub upload_dir: PathBuf,

    /// Directory holding static assets served under `/public`.
    pub public_dir: PathBuf,
}

impl MediaLibrary {
    pub fn new(upload_dir: impl Into<PathBuf>, public_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            public_dir: public_dir.into(),
        }
    }

    /// Validate a single stored-file name arriving from a request path.
    ///
    /// Rejects anything that is not a plain file name: empty names,
    /// over-long names, path separators, `..`, and control bytes. Keeps
    /// resolution strictly inside the upload directory.
    fn ensure_name_safe(&self, name: &str) -> LibraryResult<()> {
        if name.is_empty() || name.len() > MAX_FILE_NAME_LEN {
            return Err(LibraryError::InvalidFileName);
        }
        if name == "." || name == ".." {
            return Err(LibraryError::InvalidFileName);
        }
        if name.contains('/') || name.contains('\\') {
            return Err(LibraryError::InvalidFileName);
        }
        if name.bytes().any(|b| b.is_ascii_control() || b == b'\0') {
            return Err(LibraryError::InvalidFileName);
        }
        Ok(())
    }

    /// Validate a relative asset path under the public directory.
    ///
    /// Unlike stored-file names, asset paths may contain `/` segments, but
    /// every component must be a normal one — no `..`, no roots, no drive
    /// prefixes. This replaces string-prefix checks with a structural one.
    fn ensure_rel_path_safe(&self, rel: &str) -> LibraryResult<()> {
        if rel.is_empty() || rel.len() > 4 * MAX_FILE_NAME_LEN {
            return Err(LibraryError::InvalidFileName);
        }
        if rel.contains('\\') || rel.bytes().any(|b| b.is_ascii_control() || b == b'\0') {
            return Err(LibraryError::InvalidFileName);
        }
        let path = Path::new(rel);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(LibraryError::InvalidFileName);
        }
        Ok(())
    }

    /// Reduce a client-supplied original name to a safe basename.
    ///
    /// Takes the final component after either separator, strips control
    /// bytes, and falls back to `upload` when nothing survives.
    fn sanitize_original(name: &str) -> String {
        let basename = name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(name)
            .chars()
            .filter(|c| !c.is_control())
            .collect::<String>();
        let trimmed = basename.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            "upload".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Derive the permanent stored name for an accepted upload:
    /// `<unix-millis>-<sanitized-basename>`.
    fn stored_name_for(original: &str) -> String {
        format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            Self::sanitize_original(original)
        )
    }

    fn upload_path(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    /// Stream an upload to disk and return its stored record.
    ///
    /// - Rejects non-allow-listed extensions before any byte is written.
    /// - Writes bytes incrementally to a `.tmp-<uuid>` file.
    /// - Renames into the permanent name once the stream is drained and
    ///   fsynced; the timestamp prefix is taken at rename time.
    ///
    /// Any failure removes the temp file, so a failed upload never leaves
    /// an entry behind in the directory listing (dot-prefixed temp names
    /// are additionally filtered out of listings).
    pub async fn store_stream<S>(&self, original_name: &str, stream: S) -> LibraryResult<StoredFile>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        if !media_types::is_allowed_audio(original_name) {
            let ext = media_types::extension_of(original_name).unwrap_or_default();
            return Err(LibraryError::UnsupportedFormat(ext));
        }

        let tmp_path = self.upload_dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(LibraryError::Stream(err));
                }
            };
            size_bytes += chunk.len() as u64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(LibraryError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(LibraryError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(LibraryError::Io(err));
        }
        drop(file);

        let stored_name = Self::stored_name_for(original_name);
        let final_path = self.upload_path(&stored_name);
        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(LibraryError::Io(err));
        }
        debug!("stored upload {}", final_path.display());

        Ok(StoredFile {
            name: stored_name.clone(),
            size_bytes,
            content_type: media_types::audio_content_type(&stored_name).map(str::to_string),
            last_modified: Utc::now(),
        })
    }

    /// Open a stored file for streaming out.
    ///
    /// Returns its record and an opened handle. Missing file → FileNotFound.
    pub async fn open_reader(&self, name: &str) -> LibraryResult<(StoredFile, File)> {
        self.ensure_name_safe(name)?;
        let path = self.upload_path(name);
        self.open_at(&path, name).await
    }

    /// Open a public asset for streaming out.
    ///
    /// `rel` may contain `/` segments but must stay under the public root.
    pub async fn open_public(&self, rel: &str) -> LibraryResult<(StoredFile, File)> {
        self.ensure_rel_path_safe(rel)?;
        let path = self.public_dir.join(rel);
        self.open_at(&path, rel).await
    }

    async fn open_at(&self, path: &Path, name: &str) -> LibraryResult<(StoredFile, File)> {
        let file = File::open(path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                LibraryError::FileNotFound(name.to_string())
            } else {
                LibraryError::Io(err)
            }
        })?;
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(LibraryError::FileNotFound(name.to_string()));
        }
        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Ok((
            StoredFile {
                name: name.to_string(),
                size_bytes: meta.len(),
                content_type: Some(media_types::serve_content_type(name).to_string()),
                last_modified,
            },
            file,
        ))
    }

    /// Scan the upload directory and return every stored file, sorted by
    /// name. Skips subdirectories and dot-prefixed entries (in-flight temp
    /// files). The directory is re-read on every call; nothing is cached.
    pub async fn list_files(&self) -> LibraryResult<Vec<StoredFile>> {
        let mut entries = fs::read_dir(&self.upload_dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.starts_with('.') {
                continue;
            }
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let last_modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            files.push(StoredFile {
                content_type: media_types::audio_content_type(&name).map(str::to_string),
                name,
                size_bytes: meta.len(),
                last_modified,
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}
