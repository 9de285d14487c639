//! Session-related types.
//!
//! Types stored in the cookie session for authentication state.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use profile_desk_core::{Session, SessionUser};

/// Session-stored identity.
///
/// Set by the hand-off endpoint once the identity provider has resolved the
/// access token; converted into a [`Session`] per request.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredSession {
    access_token: String,
    /// Resolved user for the token.
    pub user: SessionUser,
}

impl StoredSession {
    /// Pair an access token with its resolved user.
    #[must_use]
    pub fn new(access_token: &SecretString, user: SessionUser) -> Self {
        Self {
            access_token: access_token.expose_secret().to_owned(),
            user,
        }
    }

    /// The profile-layer view of this session.
    #[must_use]
    pub fn to_session(&self) -> Session {
        Session::new(
            SecretString::from(self.access_token.clone()),
            self.user.clone(),
        )
    }
}

impl std::fmt::Debug for StoredSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSession")
            .field("access_token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the signed-in user and their access token.
    pub const CURRENT_SESSION: &str = "current_session";
}
