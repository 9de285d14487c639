//! Ports to the remote profile store and identity provider.
//!
//! Services receive these as `Arc<dyn …>` so tests can substitute fakes for
//! the Supabase client.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use profile_desk_core::{Profile, ProfileFields, ProfileUpsert, Session, SessionUser, UserId};

/// Errors reported by a store or identity provider.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The query matched no rows.
    #[error("no rows returned")]
    NotFound,

    /// The access token was missing, expired or rejected.
    #[error("unauthorized")]
    Unauthorized,

    /// The store answered with a non-success status.
    #[error("store rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Store-provided message, or the raw body.
        message: String,
    },

    /// The identity provider returned a user we cannot use.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The store endpoint could not be built from the project URL.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Record store holding profile rows.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch the editable columns of the row whose `id` matches.
    ///
    /// Returns [`StoreError::NotFound`] when no row exists yet.
    async fn fetch_one(&self, session: &Session, id: &UserId)
    -> Result<ProfileFields, StoreError>;

    /// Insert or update the row keyed on `record.id`, returning the stored row.
    async fn upsert(&self, session: &Session, record: &ProfileUpsert)
    -> Result<Profile, StoreError>;
}

/// Identity collaborator that owns sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user an access token belongs to.
    async fn resolve_user(&self, access_token: &SecretString) -> Result<SessionUser, StoreError>;

    /// Terminate the session.
    async fn sign_out(&self, session: &Session) -> Result<(), StoreError>;
}
