pub mod library_service;
pub mod media_types;
