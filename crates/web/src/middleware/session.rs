//! Session middleware configuration.
//!
//! Cookie sessions live in process memory: they only remember which access
//! token the hosting shell handed over. Restarting the server signs
//! everyone out of the account page, not out of Supabase. Expired sessions
//! are dropped from memory by [`SessionCache`].

use tower_sessions::{Expiry, SessionManagerLayer};

use super::session_store::SessionCache;
use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "pd_session";

/// Session expiry time in seconds (1 hour, Supabase's default JWT lifetime).
const SESSION_EXPIRY_SECONDS: i64 = 60 * 60;

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    config: &ServerConfig,
    store: SessionCache,
) -> SessionManagerLayer<SessionCache> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
