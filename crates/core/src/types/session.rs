//! Authenticated session types.
//!
//! Sessions are issued by the identity provider. Profile Desk only reads
//! them: the access token authorizes store calls and the resolved user
//! decides which profile row is touched.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// The resolved principal behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Unique user identifier.
    pub id: UserId,
    /// The user's email address.
    pub email: Email,
}

/// Proof of an authenticated principal.
///
/// `user` is `None` until the identity provider has resolved who the token
/// belongs to; profile operations refuse to run without it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token forwarded to the store. Redacted in `Debug` output.
    pub access_token: SecretString,
    /// Resolved identity, if any.
    pub user: Option<SessionUser>,
}

impl Session {
    /// Create a session with a resolved user.
    #[must_use]
    pub const fn new(access_token: SecretString, user: SessionUser) -> Self {
        Self {
            access_token,
            user: Some(user),
        }
    }

    /// Create a session whose user has not been resolved.
    #[must_use]
    pub const fn unresolved(access_token: SecretString) -> Self {
        Self {
            access_token,
            user: None,
        }
    }

    /// The resolved user's ID, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }

    /// The resolved user's email, if any.
    #[must_use]
    pub fn email(&self) -> Option<&Email> {
        self.user.as_ref().map(|user| &user.email)
    }
}
