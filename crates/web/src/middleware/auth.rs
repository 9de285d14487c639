//! Session extractor and helpers.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session as CookieSession;

use crate::models::{StoredSession, session_keys};

/// Extractor that requires a handed-off session.
///
/// Without one, the request is redirected to `/`, where the hosting shell
/// owns sign-in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireSession(stored): RequireSession) -> impl IntoResponse {
///     format!("Hello, {}!", stored.user.email)
/// }
/// ```
pub struct RequireSession(pub StoredSession);

/// Error returned when no session has been handed off.
pub enum SessionRejection {
    /// Redirect to the shell's landing page.
    RedirectHome,
    /// The session layer is missing from the router.
    MissingLayer,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::MissingLayer => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<CookieSession>()
            .ok_or(SessionRejection::MissingLayer)?;

        let stored: StoredSession = session
            .get(session_keys::CURRENT_SESSION)
            .await
            .ok()
            .flatten()
            .ok_or(SessionRejection::RedirectHome)?;

        Ok(Self(stored))
    }
}

/// Store the handed-off session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_session(
    session: &CookieSession,
    stored: &StoredSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_SESSION, stored).await
}

/// Remove the handed-off session and destroy the cookie session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_session(
    session: &CookieSession,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<StoredSession>(session_keys::CURRENT_SESSION)
        .await?;
    session.flush().await
}
