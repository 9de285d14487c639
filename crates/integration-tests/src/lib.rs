//! Integration tests for Profile Desk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p profile-desk-integration-tests
//! ```
//!
//! No external services are needed: [`FakeSupabase`] serves the slice of
//! PostgREST and GoTrue the account page talks to, with row-level security
//! reduced to "a user may only touch their own row".
//!
//! # Test Categories
//!
//! - `supabase_client` - `SupabaseClient` against the fake project
//! - `account_flow` - the account page end to end, cookies included

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use url::Url;

use profile_desk_web::{AppState, ServerConfig, SupabaseConfig, routes};

/// Project API key the fake expects in the `apikey` header.
pub const ANON_KEY: &str = "anon-7Qh2Xv9LmP4sWzK1";

/// One request as the fake saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub prefer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct FakeState {
    /// access token -> (user id, email)
    users: HashMap<String, (String, String)>,
    revoked: HashSet<String>,
    /// user id -> stored row
    rows: HashMap<String, Map<String, Value>>,
    requests: Vec<RecordedRequest>,
    rest_failure: Option<StatusCode>,
}

/// In-process stand-in for a Supabase project.
#[derive(Clone, Default)]
pub struct FakeSupabase {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeSupabase {
    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a user reachable through `token`.
    #[must_use]
    pub fn with_user(self, token: &str, id: &str, email: &str) -> Self {
        self.lock()
            .users
            .insert(token.to_string(), (id.to_string(), email.to_string()));
        self
    }

    /// Seed a profile row.
    #[must_use]
    pub fn with_row(self, id: &str, row: &Value) -> Self {
        let mut stored = row.as_object().cloned().unwrap_or_default();
        stored.insert("id".to_string(), json!(id));
        self.lock().rows.insert(id.to_string(), stored);
        self
    }

    /// Answer every `/rest/v1` request with `status`.
    pub fn fail_rest_with(&self, status: StatusCode) {
        self.lock().rest_failure = Some(status);
    }

    /// The stored row for `id`.
    #[must_use]
    pub fn row(&self, id: &str) -> Option<Map<String, Value>> {
        self.lock().rows.get(id).cloned()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Whether `token` was revoked through `/auth/v1/logout`.
    #[must_use]
    pub fn is_revoked(&self, token: &str) -> bool {
        self.lock().revoked.contains(token)
    }

    /// Serve the fake on an ephemeral port and return its base URL.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn spawn(&self) -> Url {
        let router = Router::new()
            .route("/auth/v1/user", get(auth_user))
            .route("/auth/v1/logout", post(auth_logout))
            .route("/rest/v1/profiles", get(select_profile).post(upsert_profile))
            .with_state(self.clone());

        let addr = serve(router).await;
        Url::parse(&format!("http://{addr}")).expect("valid fake URL")
    }

    fn record(
        &self,
        method: &'static str,
        path: &'static str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        body: Option<Value>,
    ) {
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let request = RecordedRequest {
            method,
            path,
            query,
            apikey: value("apikey"),
            authorization: value(header::AUTHORIZATION.as_str()),
            accept: value(header::ACCEPT.as_str()),
            prefer: value("prefer"),
            body,
        };
        self.lock().requests.push(request);
    }

    /// Resolve the caller, GoTrue style.
    fn caller(&self, headers: &HeaderMap) -> Result<(String, String), Response> {
        if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Invalid API key"})),
            )
                .into_response());
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();

        let state = self.lock();
        if state.revoked.contains(token) {
            return Err(invalid_jwt());
        }
        state.users.get(token).cloned().ok_or_else(invalid_jwt)
    }
}

fn invalid_jwt() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"code": "PGRST301", "msg": "invalid JWT", "message": "JWT expired"})),
    )
        .into_response()
}

async fn auth_user(State(fake): State<FakeSupabase>, headers: HeaderMap) -> Response {
    fake.record("GET", "/auth/v1/user", &headers, HashMap::new(), None);
    match fake.caller(&headers) {
        Ok((id, email)) => Json(json!({
            "id": id,
            "aud": "authenticated",
            "role": "authenticated",
            "email": email,
        }))
        .into_response(),
        Err(response) => response,
    }
}

async fn auth_logout(State(fake): State<FakeSupabase>, headers: HeaderMap) -> Response {
    fake.record("POST", "/auth/v1/logout", &headers, HashMap::new(), None);
    if let Err(response) = fake.caller(&headers) {
        return response;
    }

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    fake.lock().revoked.insert(token);
    StatusCode::NO_CONTENT.into_response()
}

async fn select_profile(
    State(fake): State<FakeSupabase>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    fake.record("GET", "/rest/v1/profiles", &headers, query.clone(), None);
    if let Some(status) = fake.lock().rest_failure {
        return (status, Json(json!({"message": "upstream unavailable"}))).into_response();
    }
    let (caller_id, _) = match fake.caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let id = query
        .get("id")
        .and_then(|filter| filter.strip_prefix("eq."))
        .unwrap_or_default();
    let columns: Vec<&str> = query
        .get("select")
        .map_or_else(Vec::new, |select| select.split(',').collect());

    // Row-level security: other users' rows are invisible.
    let row = (id == caller_id).then(|| fake.row(id)).flatten();

    match row {
        Some(row) => {
            let selected: Map<String, Value> = columns
                .iter()
                .map(|c| ((*c).to_string(), row.get(*c).cloned().unwrap_or(Value::Null)))
                .collect();
            Json(Value::Object(selected)).into_response()
        }
        None => (
            StatusCode::NOT_ACCEPTABLE,
            Json(json!({
                "code": "PGRST116",
                "details": "The result contains 0 rows",
                "hint": null,
                "message": "JSON object requested, multiple (or no) rows returned",
            })),
        )
            .into_response(),
    }
}

async fn upsert_profile(
    State(fake): State<FakeSupabase>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    fake.record("POST", "/rest/v1/profiles", &headers, query, Some(body.clone()));
    if let Some(status) = fake.lock().rest_failure {
        return (status, Json(json!({"message": "upstream unavailable"}))).into_response();
    }
    let (caller_id, _) = match fake.caller(&headers) {
        Ok(caller) => caller,
        Err(response) => return response,
    };

    let Some(incoming) = body.as_object().cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"code": "PGRST102", "message": "Empty or invalid json"})),
        )
            .into_response();
    };
    if incoming.get("id").and_then(Value::as_str) != Some(caller_id.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "code": "42501",
                "message": "new row violates row-level security policy for table \"profiles\"",
            })),
        )
            .into_response();
    }

    let mut state = fake.lock();
    let row = state.rows.entry(caller_id).or_default();
    row.extend(incoming);
    let stored = Value::Object(row.clone());
    drop(state);

    (StatusCode::CREATED, Json(stored)).into_response()
}

/// Serve `router` on `127.0.0.1:0`.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server error");
    });

    addr
}

/// Supabase settings pointing at `url`.
#[must_use]
pub fn supabase_config(url: Url) -> SupabaseConfig {
    SupabaseConfig {
        url,
        anon_key: SecretString::from(ANON_KEY),
        timeout: Duration::from_secs(5),
    }
}

/// Serve the account page against the fake project and return its base URL.
///
/// # Panics
///
/// Panics if the application state cannot be built.
pub async fn spawn_account_page(fake: &FakeSupabase) -> String {
    let supabase_url = fake.spawn().await;
    let state = AppState::new(ServerConfig::local(supabase_config(supabase_url)))
        .expect("Failed to build application state");

    let addr = serve(routes::app(state)).await;
    format!("http://{addr}")
}

/// A cookie-keeping client that does not follow redirects.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}
