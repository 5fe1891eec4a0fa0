//! Data models for the application
//!
//! Each sub-module represents one feature area; everything is re-exported here.

mod content;
mod media;
mod session;
mod user;

pub use content::*;
pub use media::*;
pub use session::*;
pub use user::*;
