//! Profile synchronization: loading and saving the current user's row.
//!
//! `ProfileService` is stateless apart from its clock; the account
//! controller owns the edit state and the busy flag.

mod clock;
mod error;
#[cfg(test)]
pub(crate) mod fakes;
mod store;

use clock::UpdateClock;
pub use error::ProfileError;
pub use store::{IdentityProvider, ProfileStore, StoreError};

use std::sync::Arc;

use profile_desk_core::{Profile, ProfileFields, ProfileUpsert, Session};

/// Loads and saves profiles through an injected [`ProfileStore`].
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    clock: Arc<UpdateClock>,
}

impl ProfileService {
    /// Create a service over `store` using the wall clock.
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            clock: Arc::new(UpdateClock::default()),
        }
    }

    /// Fetch the editable fields of the session user's profile.
    ///
    /// Returns `Ok(None)` when the user has no profile row yet.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NoUser`] if the session has no resolved user; the
    ///   store is not called.
    /// - [`ProfileError::Fetch`] for any store error other than "no rows".
    pub async fn load(&self, session: &Session) -> Result<Option<ProfileFields>, ProfileError> {
        let user_id = session.user_id().ok_or(ProfileError::NoUser)?;

        match self.store.fetch_one(session, user_id).await {
            Ok(fields) => Ok(Some(fields)),
            Err(StoreError::NotFound) => {
                tracing::debug!(user_id = %user_id, "No profile row yet");
                Ok(None)
            }
            Err(e) => Err(ProfileError::Fetch(e)),
        }
    }

    /// Upsert `fields` as the session user's profile.
    ///
    /// The payload's `id` is always the session user's ID and `updated_at`
    /// is strictly later than any previous write from this service.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::NoUser`] if the session has no resolved user; the
    ///   store is not called.
    /// - [`ProfileError::Write`] if the store rejects the write.
    pub async fn save(
        &self,
        session: &Session,
        fields: ProfileFields,
    ) -> Result<Profile, ProfileError> {
        let user_id = session.user_id().ok_or(ProfileError::NoUser)?;

        let record = ProfileUpsert {
            id: user_id.clone(),
            fields,
            updated_at: self.clock.next(),
        };

        self.store
            .upsert(session, &record)
            .await
            .map_err(ProfileError::Write)
    }
}
