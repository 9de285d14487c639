//! In-memory store and identity fakes for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::Notify;

use profile_desk_core::{
    Email, Profile, ProfileFields, ProfileUpsert, Session, SessionUser, UserId,
};

use super::store::{IdentityProvider, ProfileStore, StoreError};

pub fn session_for(id: &str, email: &str) -> Session {
    Session::new(
        SecretString::from("test-access-token"),
        SessionUser {
            id: UserId::parse(id).unwrap(),
            email: Email::parse(email).unwrap(),
        },
    )
}

pub fn unresolved_session() -> Session {
    Session::unresolved(SecretString::from("test-access-token"))
}

/// Upsert-semantics store keyed on profile `id`.
#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<HashMap<UserId, Profile>>,
    upserts: Mutex<Vec<ProfileUpsert>>,
    fetch_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    fetch_failure: Mutex<Option<u16>>,
    upsert_failure: Mutex<Option<u16>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
    acknowledged: Mutex<Option<ProfileFields>>,
}

impl FakeStore {
    pub fn insert_row(&self, id: &str, fields: ProfileFields) {
        let id = UserId::parse(id).unwrap();
        self.rows.lock().unwrap().insert(
            id.clone(),
            Profile {
                id,
                fields,
                updated_at: None,
            },
        );
    }

    pub fn row(&self, id: &str) -> Option<Profile> {
        let id = UserId::parse(id).unwrap();
        self.rows.lock().unwrap().get(&id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn upserts(&self) -> Vec<ProfileUpsert> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn fail_fetch_with(&self, status: u16) {
        *self.fetch_failure.lock().unwrap() = Some(status);
    }

    pub fn fail_upsert_with(&self, status: u16) {
        *self.upsert_failure.lock().unwrap() = Some(status);
    }

    /// Store and return `fields` for every upsert, whatever was sent,
    /// like a row trigger rewriting the submitted values.
    pub fn acknowledge_with(&self, fields: ProfileFields) {
        *self.acknowledged.lock().unwrap() = Some(fields);
    }

    /// Make every call wait until the returned `Notify` is signalled.
    pub fn hold_calls(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl ProfileStore for FakeStore {
    async fn fetch_one(
        &self,
        _session: &Session,
        id: &UserId,
    ) -> Result<ProfileFields, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        if let Some(status) = *self.fetch_failure.lock().unwrap() {
            return Err(StoreError::Rejected {
                status,
                message: "fetch failed".to_string(),
            });
        }

        self.rows
            .lock()
            .unwrap()
            .get(id)
            .map(|row| row.fields.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn upsert(
        &self,
        _session: &Session,
        record: &ProfileUpsert,
    ) -> Result<Profile, StoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.upserts.lock().unwrap().push(record.clone());
        self.wait_for_gate().await;

        if let Some(status) = *self.upsert_failure.lock().unwrap() {
            return Err(StoreError::Rejected {
                status,
                message: "upsert failed".to_string(),
            });
        }

        let mut profile = record.clone().into_profile();
        if let Some(fields) = self.acknowledged.lock().unwrap().clone() {
            profile.fields = fields;
        }
        self.rows
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }
}

/// Identity provider that resolves every token to a fixed user.
pub struct FakeIdentity {
    user: SessionUser,
    sign_outs: AtomicUsize,
    fail_sign_out: bool,
}

impl FakeIdentity {
    pub fn new(id: &str, email: &str) -> Self {
        Self {
            user: SessionUser {
                id: UserId::parse(id).unwrap(),
                email: Email::parse(email).unwrap(),
            },
            sign_outs: AtomicUsize::new(0),
            fail_sign_out: false,
        }
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn sign_outs(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn resolve_user(&self, _access_token: &SecretString) -> Result<SessionUser, StoreError> {
        Ok(self.user.clone())
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), StoreError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(StoreError::Unauthorized);
        }
        Ok(())
    }
}
