//! Database repositories
//!
//! Each store is a trait so services can run against PostgreSQL in production and
//! the in-memory store in tests. Unique and foreign-key violations surface as
//! `AppError::Duplicate` and `AppError::Conflict` from both implementations.

pub mod content;
pub mod media;
#[cfg(feature = "memory")]
pub mod memory;
pub mod session;
pub mod user;

pub use content::{ContentRepository, ContentStore};
pub use media::{MediaRepository, MediaStore};
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use session::{SessionRepository, SessionStore};
pub use user::{UserRepository, UserStore};
