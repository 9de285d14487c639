//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, in-memory store with expiry)

pub mod auth;
pub mod request_id;
pub mod session;
pub mod session_store;

pub use auth::{RequireSession, clear_current_session, set_current_session};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
pub use session_store::{PURGE_INTERVAL, SessionCache};
