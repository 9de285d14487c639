//! Supabase PostgREST and GoTrue client.
//!
//! # Architecture
//!
//! - One `reqwest::Client` shared by the REST ([`ProfileStore`]) and auth
//!   ([`IdentityProvider`]) halves
//! - Supabase is the source of truth; nothing is cached locally
//! - Every request carries the project `apikey` and the session's bearer
//!   token, so row-level security applies as the signed-in user
//!
//! # Example
//!
//! ```rust,ignore
//! use profile_desk_web::supabase::SupabaseClient;
//!
//! let client = SupabaseClient::new(&config.supabase)?;
//! let user = client.resolve_user(&access_token).await?;
//! let fields = client.fetch_one(&session, &user.id).await?;
//! ```
//!
//! [`ProfileStore`]: crate::services::ProfileStore
//! [`IdentityProvider`]: crate::services::IdentityProvider

mod auth;
mod rest;

use std::sync::Arc;

use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::SupabaseConfig;
use crate::services::StoreError;

/// PostgREST error code for "JSON object requested, multiple (or no) rows returned".
const NO_ROWS_CODE: &str = "PGRST116";

/// Client for a Supabase project's REST and auth APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: with_trailing_slash(config.url.clone()),
                anon_key: config.anon_key.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Attach the project key and the caller's bearer token.
    fn authorized(&self, builder: RequestBuilder, access_token: &SecretString) -> RequestBuilder {
        builder
            .header("apikey", self.inner.anon_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
    }
}

/// Read a response body, turning non-success statuses into [`StoreError`]s.
async fn success_body(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(error_for_status(status.as_u16(), &body))
    }
}

/// Classify an error response from PostgREST or GoTrue.
fn error_for_status(status: u16, body: &str) -> StoreError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|value| value.get(name))
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
    };

    if status == 406 || field("code").as_deref() == Some(NO_ROWS_CODE) {
        return StoreError::NotFound;
    }
    if status == 401 || status == 403 {
        return StoreError::Unauthorized;
    }

    let message = field("message")
        .or_else(|| field("msg"))
        .or_else(|| field("error_description"))
        .unwrap_or_else(|| body.trim().to_owned());

    StoreError::Rejected { status, message }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
