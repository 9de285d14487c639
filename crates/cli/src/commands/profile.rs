//! Profile commands.
//!
//! # Usage
//!
//! ```bash
//! pd-cli profile show
//! pd-cli profile update -u alice -w https://alice.dev
//! pd-cli sign-out
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Supabase project URL
//! - `SUPABASE_ANON_KEY` - Supabase project API key

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;

use profile_desk_core::{EditState, Session};
use profile_desk_web::config::{ConfigError, SupabaseConfig};
use profile_desk_web::services::{
    AccountController, IdentityProvider, LoadOutcome, ProfileError, ProfileService, StoreError,
};
use profile_desk_web::supabase::SupabaseClient;

/// Errors that can occur during profile commands.
#[derive(Debug, Error)]
pub enum ProfileCommandError {
    /// Supabase settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The access token could not be resolved to a user.
    #[error("Could not resolve session: {0}")]
    Identity(#[from] StoreError),

    /// Loading or saving the profile failed.
    #[error("{0}")]
    Profile(#[from] ProfileError),
}

/// Fields given on the command line; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileEdits {
    pub username: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileEdits {
    /// Whether no field was given.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.website.is_none() && self.avatar_url.is_none()
    }

    /// Write the given fields into the controller's edit state.
    pub fn apply(self, account: &AccountController) {
        if let Some(username) = self.username {
            account.set_username(Some(username));
        }
        if let Some(website) = self.website {
            account.set_website(Some(website));
        }
        if let Some(avatar_url) = self.avatar_url {
            account.set_avatar_url(Some(avatar_url));
        }
    }
}

/// Load and print the stored profile.
///
/// # Errors
///
/// Returns an error if configuration is missing, the token is rejected, or
/// the profile cannot be loaded.
pub async fn show(access_token: SecretString) -> Result<(), ProfileCommandError> {
    let (account, session) = connect(access_token).await?;

    if account.attach(session).await? == LoadOutcome::Empty {
        tracing::info!("No profile stored yet");
    }
    log_profile(&account.snapshot());

    Ok(())
}

/// Load the profile, apply `edits`, and write it back.
///
/// # Errors
///
/// Returns an error if configuration is missing, the token is rejected, or
/// the profile cannot be loaded or saved.
pub async fn update(
    access_token: SecretString,
    edits: ProfileEdits,
) -> Result<(), ProfileCommandError> {
    if edits.is_empty() {
        tracing::warn!("No fields given; writing the stored profile back unchanged");
    }

    let (account, session) = connect(access_token).await?;

    account.attach(session).await?;
    edits.apply(&account);
    let profile = account.update().await?;

    tracing::info!("Profile updated at {:?}", profile.updated_at);
    log_profile(&account.snapshot());

    Ok(())
}

/// Revoke the access token at Supabase.
///
/// Revocation itself is best effort and only logged on failure.
///
/// # Errors
///
/// Returns an error if configuration is missing or the token is rejected.
pub async fn sign_out(access_token: SecretString) -> Result<(), ProfileCommandError> {
    let (account, session) = connect(access_token).await?;

    account.bind_session(session);
    account.sign_out().await;

    tracing::info!("Signed out");
    Ok(())
}

/// Resolve the token and build a controller over the Supabase client.
///
/// Ctrl-C tears the controller down.
async fn connect(
    access_token: SecretString,
) -> Result<(AccountController, Arc<Session>), ProfileCommandError> {
    let config = SupabaseConfig::from_env()?;
    let client = Arc::new(SupabaseClient::new(&config)?);

    tracing::info!("Resolving session at {}", config.url);
    let user = client.resolve_user(&access_token).await?;
    tracing::info!(user_id = %user.id, "Signed in as {}", user.email);

    let account = AccountController::new(ProfileService::new(client.clone()), client);
    teardown_on_ctrl_c(&account);

    Ok((account, Arc::new(Session::new(access_token, user))))
}

fn teardown_on_ctrl_c(account: &AccountController) {
    let account = account.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; discarding pending profile operation");
            account.teardown();
        }
    });
}

fn log_profile(state: &EditState) {
    tracing::info!("username:   {}", state.username().unwrap_or("-"));
    tracing::info!("website:    {}", state.website().unwrap_or("-"));
    tracing::info!("avatar_url: {}", state.avatar_url().unwrap_or("-"));
}
