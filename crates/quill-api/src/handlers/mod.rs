pub mod auth;
pub mod content_media;
pub mod health;
pub mod media;
pub mod media_upload;
