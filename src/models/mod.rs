//! Data models for the audio hosting service.
//!
//! There is deliberately no database: the upload directory is the index,
//! so these records are built from directory entries on demand and
//! serialize naturally as JSON via `serde`.

pub mod stored_file;
