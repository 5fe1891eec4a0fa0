//! Credentials, sessions and the authorization gate.

pub mod extractor;
pub mod gate;
pub mod password;
pub mod session;

pub use extractor::AuthSession;
pub use gate::{require, AuthContext};
pub use password::{hash_password, verify_password};
pub use session::{Registration, SessionManager};
