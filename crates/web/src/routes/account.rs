//! Account route handlers.
//!
//! These routes require a handed-off session.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::add_breadcrumb;
use crate::middleware::RequireSession;
use crate::models::StoredSession;
use crate::services::{AccountController, ProfileError};
use crate::state::AppState;

/// Profile form data.
///
/// Browsers submit empty inputs as `""`, which is stored as-is. The avatar
/// URL rides along in a hidden input and is absent when unset.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Outcome message shown above the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub success: bool,
    pub message: &'static str,
}

impl Notice {
    pub const UPDATED: &'static str = "Profile updated";
    pub const LOAD_FAILED: &'static str = "Error loading user data!";
    pub const UPDATE_FAILED: &'static str = "Error updating the data";

    /// Notice for a failed load. Discarded operations show nothing.
    #[must_use]
    pub const fn for_load_error(error: &ProfileError) -> Option<Self> {
        match error {
            ProfileError::Cancelled => None,
            _ => Some(Self {
                success: false,
                message: Self::LOAD_FAILED,
            }),
        }
    }

    /// Notice for a finished write.
    #[must_use]
    pub const fn for_update<T>(result: &Result<T, ProfileError>) -> Option<Self> {
        match result {
            Ok(_) => Some(Self {
                success: true,
                message: Self::UPDATED,
            }),
            Err(ProfileError::Cancelled) => None,
            Err(_) => Some(Self {
                success: false,
                message: Self::UPDATE_FAILED,
            }),
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        if self.success { "notice-success" } else { "notice-error" }
    }
}

/// Account form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub email: String,
    pub username: String,
    pub website: String,
    pub avatar_url: Option<String>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

impl AccountTemplate {
    fn render_for(
        account: &AccountController,
        stored: &StoredSession,
        notice: Option<Notice>,
    ) -> Self {
        let state = account.snapshot();
        Self {
            email: stored.user.email.to_string(),
            username: state.username().unwrap_or_default().to_owned(),
            website: state.website().unwrap_or_default().to_owned(),
            avatar_url: state.avatar_url().map(str::to_owned),
            loading: state.is_loading(),
            notice,
        }
    }
}

/// Display the account form with the stored profile.
pub async fn show(
    State(state): State<AppState>,
    RequireSession(stored): RequireSession,
) -> Response {
    let account = state.account_controller();

    let notice = match account.attach(Arc::new(stored.to_session())).await {
        Ok(_) => None,
        Err(e) => Notice::for_load_error(&e),
    };

    AccountTemplate::render_for(&account, &stored, notice).into_response()
}

/// Save the submitted form.
///
/// The submitted values are authoritative for this request; the page is
/// re-rendered with them (or the store's acknowledged values) and a notice.
pub async fn update(
    State(state): State<AppState>,
    RequireSession(stored): RequireSession,
    Form(form): Form<ProfileForm>,
) -> Response {
    add_breadcrumb("profile", "Submitted profile form");

    let account = state.account_controller();
    account.bind_session(Arc::new(stored.to_session()));
    account.set_username(form.username);
    account.set_website(form.website);
    account.set_avatar_url(form.avatar_url);

    let result = account.update().await;
    let notice = Notice::for_update(&result);

    AccountTemplate::render_for(&account, &stored, notice).into_response()
}
