//! The account component: edit state bound to a session.
//!
//! `AccountController` is what the account page and the CLI drive. It holds
//! the attached session, the in-memory [`EditState`], and a lifetime token.
//! Every store operation:
//!
//! - sets `loading` for its duration and clears it on every exit path,
//! - is attempted exactly once,
//! - resolves to [`ProfileError::Cancelled`] without touching state if the
//!   controller is torn down first.
//!
//! Overlapping operations are not serialized; the last one to finish decides
//! the final `loading` value.

use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use tokio_util::sync::CancellationToken;

use profile_desk_core::{EditState, Email, Profile, Session};

use super::profile::{IdentityProvider, ProfileError, ProfileService};

/// What a load did to the edit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A row was found and replaced the edit state.
    Loaded,
    /// The user has no profile row yet; the edit state was left alone.
    Empty,
    /// The same session was attached again; nothing was fetched.
    Unchanged,
}

/// Cloneable handle to one account form's state.
#[derive(Clone)]
pub struct AccountController {
    inner: Arc<Inner>,
}

struct Inner {
    profiles: ProfileService,
    identity: Arc<dyn IdentityProvider>,
    session: RwLock<Option<Arc<Session>>>,
    state: RwLock<EditState>,
    lifetime: CancellationToken,
}

/// Holds `loading` high until dropped.
struct Busy<'a> {
    state: &'a RwLock<EditState>,
}

impl<'a> Busy<'a> {
    fn start(state: &'a RwLock<EditState>) -> Self {
        write(state).set_loading(true);
        Self { state }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        write(self.state).set_loading(false);
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl AccountController {
    /// Create a controller with empty edit state and no session.
    #[must_use]
    pub fn new(profiles: ProfileService, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                profiles,
                identity,
                session: RwLock::new(None),
                state: RwLock::new(EditState::new()),
                lifetime: CancellationToken::new(),
            }),
        }
    }

    /// Attach `session` and load its profile.
    ///
    /// Loads on the first attach and whenever a different session reference
    /// is attached. Re-attaching the same `Arc` is a no-op.
    ///
    /// # Errors
    ///
    /// See [`AccountController::load`].
    pub async fn attach(&self, session: Arc<Session>) -> Result<LoadOutcome, ProfileError> {
        {
            let mut current = write(&self.inner.session);
            if current
                .as_ref()
                .is_some_and(|attached| Arc::ptr_eq(attached, &session))
            {
                return Ok(LoadOutcome::Unchanged);
            }
            *current = Some(session);
        }

        self.load().await
    }

    /// Attach `session` without loading.
    ///
    /// For callers that already hold the edit state, such as a submitted
    /// form. A later [`AccountController::attach`] of the same `Arc` does
    /// not fetch.
    pub fn bind_session(&self, session: Arc<Session>) {
        *write(&self.inner.session) = Some(session);
    }

    /// Fetch the profile and replace the edit state with it.
    ///
    /// A missing row is not an error: the state keeps its current values.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NoUser`] without a session or resolved user.
    /// - [`ProfileError::Fetch`] if the store fails; state is unchanged.
    /// - [`ProfileError::Cancelled`] after [`AccountController::teardown`].
    pub async fn load(&self) -> Result<LoadOutcome, ProfileError> {
        let result = self.load_profile().await;
        if let Err(e) = &result {
            self.report("load", e);
        }
        result
    }

    async fn load_profile(&self) -> Result<LoadOutcome, ProfileError> {
        let _busy = Busy::start(&self.inner.state);
        let session = self.session().ok_or(ProfileError::NoUser)?;

        let fetched = self
            .until_teardown(self.inner.profiles.load(&session))
            .await?;

        Ok(match fetched {
            Some(fields) => {
                write(&self.inner.state).replace_fields(fields);
                LoadOutcome::Loaded
            }
            None => LoadOutcome::Empty,
        })
    }

    /// Persist the current edit state.
    ///
    /// On success the store's acknowledged values are merged back into the
    /// edit state, unless the fields were edited while the write was in
    /// flight.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NoUser`] without a session or resolved user.
    /// - [`ProfileError::Write`] if the store fails; edits are kept for retry.
    /// - [`ProfileError::Cancelled`] after [`AccountController::teardown`].
    pub async fn update(&self) -> Result<Profile, ProfileError> {
        let result = self.save_profile().await;
        match &result {
            Ok(profile) => tracing::info!(user_id = %profile.id, "Profile updated"),
            Err(e) => self.report("update", e),
        }
        result
    }

    async fn save_profile(&self) -> Result<Profile, ProfileError> {
        let _busy = Busy::start(&self.inner.state);
        let session = self.session().ok_or(ProfileError::NoUser)?;
        let submitted = self.snapshot().fields();

        let profile = self
            .until_teardown(self.inner.profiles.save(&session, submitted.clone()))
            .await?;

        let mut state = write(&self.inner.state);
        if *state.fields_ref() == submitted {
            state.replace_fields(profile.fields.clone());
        } else {
            tracing::debug!("Fields edited during write; keeping local values");
        }

        Ok(profile)
    }

    /// Ask the identity provider to end the session.
    ///
    /// Does not touch `loading`. Failures are logged and otherwise ignored.
    pub async fn sign_out(&self) {
        let Some(session) = self.session() else {
            tracing::debug!("Sign out requested without a session");
            return;
        };

        if let Err(e) = self.inner.identity.sign_out(&session).await {
            tracing::warn!(error = %e, "Sign out failed");
        }
    }

    /// Replace the username.
    pub fn set_username(&self, username: Option<String>) {
        write(&self.inner.state).set_username(username);
    }

    /// Replace the website.
    pub fn set_website(&self, website: Option<String>) {
        write(&self.inner.state).set_website(website);
    }

    /// Replace the avatar URL.
    pub fn set_avatar_url(&self, avatar_url: Option<String>) {
        write(&self.inner.state).set_avatar_url(avatar_url);
    }

    /// A copy of the current edit state.
    #[must_use]
    pub fn snapshot(&self) -> EditState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The attached session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Email of the attached session's user.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.session().and_then(|session| session.email().cloned())
    }

    /// End the controller's lifetime. In-flight and later operations are
    /// discarded.
    pub fn teardown(&self) {
        self.inner.lifetime.cancel();
    }

    /// Whether [`AccountController::teardown`] has been called.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.inner.lifetime.is_cancelled()
    }

    async fn until_teardown<T>(
        &self,
        operation: impl Future<Output = Result<T, ProfileError>>,
    ) -> Result<T, ProfileError> {
        let lifetime = &self.inner.lifetime;
        if lifetime.is_cancelled() {
            return Err(ProfileError::Cancelled);
        }

        tokio::select! {
            biased;
            () = lifetime.cancelled() => Err(ProfileError::Cancelled),
            result = operation => result,
        }
    }

    fn report(&self, operation: &'static str, error: &ProfileError) {
        let user_id = self
            .session()
            .and_then(|session| session.user_id().map(ToString::to_string))
            .unwrap_or_default();

        match error {
            ProfileError::Cancelled => {
                tracing::debug!(operation, user_id = %user_id, "Discarded result after teardown");
            }
            ProfileError::NoUser => {
                tracing::warn!(operation, "No user for profile operation");
            }
            ProfileError::Fetch(_) | ProfileError::Write(_) => {
                tracing::error!(operation, user_id = %user_id, error = %error, "Profile operation failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use profile_desk_core::ProfileFields;

    use super::*;
    use crate::services::profile::fakes::{FakeIdentity, FakeStore, session_for, unresolved_session};

    fn controller(store: &Arc<FakeStore>, identity: &Arc<FakeIdentity>) -> AccountController {
        AccountController::new(ProfileService::new(store.clone()), identity.clone())
    }

    fn setup() -> (Arc<FakeStore>, Arc<FakeIdentity>, AccountController) {
        let store = Arc::new(FakeStore::default());
        let identity = Arc::new(FakeIdentity::new("u1", "a@x.com"));
        let account = controller(&store, &identity);
        (store, identity, account)
    }

    fn alice() -> ProfileFields {
        ProfileFields {
            username: Some("alice".to_owned()),
            website: None,
            avatar_url: None,
        }
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        while !done() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_attach_populates_state() {
        let (store, _identity, account) = setup();
        store.insert_row("u1", alice());

        let outcome = account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();

        let state = account.snapshot();
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(state.username(), Some("alice"));
        assert_eq!(state.website(), None);
        assert_eq!(state.avatar_url(), None);
        assert!(!state.is_loading());
        assert_eq!(account.email().unwrap().as_str(), "a@x.com");
    }

    #[tokio::test]
    async fn test_reload_only_when_session_reference_changes() {
        let (store, _identity, account) = setup();
        store.insert_row("u1", alice());
        let session = Arc::new(session_for("u1", "a@x.com"));

        account.attach(session.clone()).await.unwrap();
        let again = account.attach(session).await.unwrap();
        assert_eq!(again, LoadOutcome::Unchanged);
        assert_eq!(store.fetch_calls(), 1);

        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        assert_eq!(store.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_bind_session_skips_load() {
        let (store, _identity, account) = setup();
        store.insert_row("u1", alice());
        let session = Arc::new(session_for("u1", "a@x.com"));

        account.bind_session(session.clone());
        account.set_website(Some("http://a.dev".to_owned()));
        assert_eq!(account.attach(session).await.unwrap(), LoadOutcome::Unchanged);

        assert_eq!(store.fetch_calls(), 0);
        assert_eq!(account.snapshot().website(), Some("http://a.dev"));
    }

    #[tokio::test]
    async fn test_not_found_leaves_fields_unset() {
        let (store, _identity, account) = setup();

        let outcome = account
            .attach(Arc::new(session_for("u2", "b@x.com")))
            .await
            .unwrap();

        assert_eq!(outcome, LoadOutcome::Empty);
        assert_eq!(account.snapshot(), EditState::new());
        assert_eq!(store.fetch_calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_state() {
        let (store, _identity, account) = setup();
        store.fail_fetch_with(500);
        account.set_username(Some("draft".to_owned()));
        let before = account.snapshot();

        let err = account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProfileError::Fetch(_)));
        assert_eq!(account.snapshot(), before);
        assert!(!account.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_no_user_issues_no_calls() {
        let (store, _identity, account) = setup();

        assert!(matches!(account.load().await, Err(ProfileError::NoUser)));
        assert!(matches!(account.update().await, Err(ProfileError::NoUser)));

        let err = account
            .attach(Arc::new(unresolved_session()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::NoUser));
        assert!(matches!(account.update().await, Err(ProfileError::NoUser)));

        assert_eq!(store.fetch_calls(), 0);
        assert_eq!(store.upsert_calls(), 0);
        assert!(!account.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_update_sends_edits() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();

        account.set_username(Some("bob".to_owned()));
        account.set_website(Some("http://b.com".to_owned()));
        let profile = account.update().await.unwrap();

        let sent = store.upserts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id.as_str(), "u1");
        assert_eq!(sent[0].fields.username.as_deref(), Some("bob"));
        assert_eq!(sent[0].fields.website.as_deref(), Some("http://b.com"));
        assert_eq!(sent[0].fields.avatar_url, None);
        assert_eq!(profile.fields, account.snapshot().fields());
        assert!(!account.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_write_error_keeps_edits() {
        let (store, _identity, account) = setup();
        store.fail_upsert_with(500);
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        account.set_username(Some("bob".to_owned()));
        let before = account.snapshot();

        let err = account.update().await.unwrap_err();

        assert!(matches!(err, ProfileError::Write(_)));
        assert_eq!(account.snapshot(), before);
    }

    #[tokio::test]
    async fn test_loading_is_set_while_in_flight() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        let gate = store.hold_calls();

        let task = tokio::spawn({
            let account = account.clone();
            async move { account.update().await }
        });
        wait_until(|| store.upsert_calls() == 1).await;
        assert!(account.snapshot().is_loading());

        gate.notify_one();
        task.await.unwrap().unwrap();
        assert!(!account.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_edits_during_write_are_not_overwritten() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        account.set_username(Some("bob".to_owned()));
        let gate = store.hold_calls();

        let task = tokio::spawn({
            let account = account.clone();
            async move { account.update().await }
        });
        wait_until(|| store.upsert_calls() == 1).await;
        account.set_username(Some("carol".to_owned()));

        gate.notify_one();
        let profile = task.await.unwrap().unwrap();
        assert_eq!(profile.fields.username.as_deref(), Some("bob"));
        assert_eq!(account.snapshot().username(), Some("carol"));
    }

    #[tokio::test]
    async fn test_teardown_discards_in_flight_load() {
        let (store, _identity, account) = setup();
        store.insert_row("u1", alice());
        let _gate = store.hold_calls();

        let task = tokio::spawn({
            let account = account.clone();
            async move { account.attach(Arc::new(session_for("u1", "a@x.com"))).await }
        });
        wait_until(|| store.fetch_calls() == 1).await;
        account.teardown();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ProfileError::Cancelled));
        assert_eq!(account.snapshot(), EditState::new());
        assert!(account.is_torn_down());
    }

    #[tokio::test]
    async fn test_update_merges_acknowledged_values() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        store.acknowledge_with(ProfileFields {
            username: Some("bob-1".to_owned()),
            ..alice()
        });
        account.set_username(Some("bob".to_owned()));

        account.update().await.unwrap();

        assert_eq!(account.snapshot().username(), Some("bob-1"));
    }

    #[tokio::test]
    async fn test_teardown_discards_in_flight_update() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        store.acknowledge_with(ProfileFields {
            username: Some("bob-1".to_owned()),
            ..alice()
        });
        account.set_username(Some("bob".to_owned()));
        let before = account.snapshot().fields();
        let gate = store.hold_calls();

        let task = tokio::spawn({
            let account = account.clone();
            async move { account.update().await }
        });
        wait_until(|| store.upsert_calls() == 1).await;
        assert!(account.snapshot().is_loading());
        account.teardown();
        gate.notify_one();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ProfileError::Cancelled));
        assert_eq!(account.snapshot().fields(), before);
        assert_eq!(account.snapshot().username(), Some("bob"));
        assert!(!account.snapshot().is_loading());
        assert!(store.row("u1").is_none());
    }

    #[tokio::test]
    async fn test_operations_after_teardown_skip_the_store() {
        let (store, _identity, account) = setup();
        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        account.teardown();

        assert!(matches!(account.update().await, Err(ProfileError::Cancelled)));
        assert_eq!(store.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_out_is_fire_and_forget() {
        let store = Arc::new(FakeStore::default());
        let identity = Arc::new(FakeIdentity::new("u1", "a@x.com").failing_sign_out());
        let account = controller(&store, &identity);

        account.sign_out().await;
        assert_eq!(identity.sign_outs(), 0);

        account
            .attach(Arc::new(session_for("u1", "a@x.com")))
            .await
            .unwrap();
        account.sign_out().await;

        assert_eq!(identity.sign_outs(), 1);
        assert!(!account.snapshot().is_loading());
    }
}
