//! PostgREST access to the `profiles` table.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use url::Url;

use profile_desk_core::{
    PROFILE_COLUMNS, PROFILES_TABLE, Profile, ProfileFields, ProfileUpsert, Session, UserId,
};

use super::{SupabaseClient, success_body};
use crate::services::{ProfileStore, StoreError};

/// Ask PostgREST for a single object; zero rows becomes HTTP 406.
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Insert-or-update on the primary key and echo the stored row.
const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

impl SupabaseClient {
    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    /// `GET /rest/v1/profiles?select=username,website,avatar_url&id=eq.{id}`
    fn profile_query_url(&self, id: &UserId) -> Result<Url, StoreError> {
        let mut url = self.table_url(PROFILES_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", &PROFILE_COLUMNS.join(","))
            .append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }
}

#[async_trait]
impl ProfileStore for SupabaseClient {
    async fn fetch_one(
        &self,
        session: &Session,
        id: &UserId,
    ) -> Result<ProfileFields, StoreError> {
        let url = self.profile_query_url(id)?;

        let response = self
            .authorized(self.inner.client.get(url), &session.access_token)
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn upsert(
        &self,
        session: &Session,
        record: &ProfileUpsert,
    ) -> Result<Profile, StoreError> {
        let mut url = self.table_url(PROFILES_TABLE)?;
        url.query_pairs_mut().append_pair("on_conflict", "id");

        let response = self
            .authorized(self.inner.client.post(url), &session.access_token)
            .header(ACCEPT, OBJECT_MEDIA_TYPE)
            .header("Prefer", UPSERT_PREFERENCE)
            .json(record)
            .send()
            .await?;

        let body = success_body(response).await?;
        if body.trim().is_empty() {
            // Some proxies strip the representation; the payload is what was stored.
            return Ok(record.clone().into_profile());
        }
        Ok(serde_json::from_str(&body)?)
    }
}
