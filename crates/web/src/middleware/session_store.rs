//! In-memory session store with expiry.
//!
//! Records live in a `moka` cache whose per-entry lifetime is the record's
//! `expiry_date`, so an abandoned session (and the access token inside it)
//! is dropped once it expires instead of lingering until restart.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store;
use tower_sessions::{ExpiredDeletion, SessionStore};

/// Upper bound on live sessions held at once.
const MAX_SESSIONS: u64 = 10_000;

/// How often expired sessions are purged.
pub const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Session store backed by a bounded `moka` cache.
#[derive(Clone)]
pub struct SessionCache {
    cache: Cache<Id, Record>,
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("entries", &self.entry_count())
            .finish()
    }
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

impl SessionCache {
    /// Create a store holding at most `max_sessions` records.
    #[must_use]
    pub fn new(max_sessions: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .expire_after(RecordExpiry)
            .build();
        Self { cache }
    }

    /// Number of records currently held, expired ones included until purged.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Purge expired sessions every `period`, forever.
    ///
    /// Meant to run as a background task.
    pub async fn purge_periodically(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = self.delete_expired().await {
                tracing::warn!(error = %e, "Failed to purge expired sessions");
            }
        }
    }
}

#[async_trait]
impl SessionStore for SessionCache {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.cache.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(session_id)
            .await
            .filter(|record| is_active(record.expiry_date)))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(session_id).await;
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SessionCache {
    async fn delete_expired(&self) -> session_store::Result<()> {
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

/// Expires each entry at its record's `expiry_date`.
struct RecordExpiry;

impl Expiry<Id, Record> for RecordExpiry {
    fn expire_after_create(&self, _id: &Id, record: &Record, _created_at: Instant) -> Option<Duration> {
        Some(time_left(record.expiry_date))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(time_left(record.expiry_date))
    }
}

fn time_left(expiry_date: OffsetDateTime) -> Duration {
    Duration::try_from(expiry_date - OffsetDateTime::now_utc()).unwrap_or(Duration::ZERO)
}

fn is_active(expiry_date: OffsetDateTime) -> bool {
    expiry_date > OffsetDateTime::now_utc()
}
