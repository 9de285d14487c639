//! HTTP route handlers for the account page.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Auth
//! POST /auth/session           - Session hand-off from the hosting shell
//! POST /auth/logout            - Sign out and clear the session
//!
//! # Account (requires session)
//! GET  /account                - Profile form, loaded from the store
//! POST /account                - Save the profile form
//! ```

pub mod account;
pub mod auth;

use axum::{
    Router,
    http::Request,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    PURGE_INTERVAL, SessionCache, create_session_layer, request_id_middleware,
};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(auth::handoff))
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/", get(account::show).post(account::update))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
}

/// Build the application with its middleware stack.
///
/// Sentry layers are added by the binary so tests can serve the router
/// without a Sentry client.
///
/// Must be called inside a Tokio runtime: it spawns the task that purges
/// expired sessions.
pub fn app(state: AppState) -> Router {
    let sessions = SessionCache::default();
    tokio::spawn(sessions.clone().purge_periodically(PURGE_INTERVAL));
    let session_layer = create_session_layer(state.config(), sessions);

    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .layer(session_layer)
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the store.
async fn health() -> &'static str {
    "ok"
}
