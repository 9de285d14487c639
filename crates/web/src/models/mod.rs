//! Domain models for the account page.

pub mod session;

pub use session::{StoredSession, keys as session_keys};
