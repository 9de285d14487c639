//! Session hand-off and logout handlers.
//!
//! Sign-in itself belongs to the hosting shell. It posts the access token it
//! obtained to `/auth/session`; this module resolves the user behind it and
//! keeps the pair in the cookie session.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tower_sessions::Session as CookieSession;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_session, set_current_session};
use crate::models::{StoredSession, session_keys};
use crate::state::AppState;

/// Hand-off form data.
#[derive(Deserialize)]
pub struct HandoffForm {
    pub access_token: String,
}

/// Accept an access token from the shell and start a session.
///
/// # Errors
///
/// Returns `BadRequest` for a blank token, `Unauthorized` when the identity
/// provider rejects it, or a session error if the cookie session cannot be
/// written.
pub async fn handoff(
    State(state): State<AppState>,
    session: CookieSession,
    Form(form): Form<HandoffForm>,
) -> Result<Response> {
    let access_token = SecretString::from(form.access_token.trim().to_owned());
    if access_token.expose_secret().is_empty() {
        return Err(AppError::BadRequest("missing access_token".to_string()));
    }

    let user = state.identity().resolve_user(&access_token).await?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    add_breadcrumb("auth", "Session handed off");
    tracing::info!(user_id = %user.id, "Session handed off");

    // New principal, new session id.
    session.cycle_id().await?;
    set_current_session(&session, &StoredSession::new(&access_token, user)).await?;

    Ok(Redirect::to("/account").into_response())
}

/// End the session locally and at the identity provider.
///
/// Remote sign-out is best effort; the cookie session is always cleared.
pub async fn logout(State(state): State<AppState>, session: CookieSession) -> Response {
    if let Ok(Some(stored)) = session
        .get::<StoredSession>(session_keys::CURRENT_SESSION)
        .await
    {
        let account = state.account_controller();
        account.bind_session(Arc::new(stored.to_session()));
        account.sign_out().await;
    }

    if let Err(e) = clear_current_session(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    clear_sentry_user();

    Redirect::to("/").into_response()
}
