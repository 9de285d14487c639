//! GoTrue access: resolving and ending sessions.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

use profile_desk_core::{Email, Session, SessionUser, UserId};

use super::{SupabaseClient, success_body};
use crate::services::{IdentityProvider, StoreError};

/// The subset of a GoTrue user object we rely on.
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TryFrom<AuthUser> for SessionUser {
    type Error = StoreError;

    fn try_from(user: AuthUser) -> Result<Self, Self::Error> {
        let id = UserId::parse(&user.id)
            .map_err(|e| StoreError::InvalidIdentity(format!("user id: {e}")))?;
        let email = user
            .email
            .as_deref()
            .ok_or_else(|| StoreError::InvalidIdentity("user has no email".to_string()))
            .and_then(|raw| {
                Email::parse(raw).map_err(|e| StoreError::InvalidIdentity(format!("email: {e}")))
            })?;

        Ok(Self { id, email })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn resolve_user(&self, access_token: &SecretString) -> Result<SessionUser, StoreError> {
        let url = self.endpoint("auth/v1/user")?;

        let response = self
            .authorized(self.inner.client.get(url), access_token)
            .send()
            .await?;

        let body = success_body(response).await?;
        let user: AuthUser = serde_json::from_str(&body)?;
        user.try_into()
    }

    async fn sign_out(&self, session: &Session) -> Result<(), StoreError> {
        let url = self.endpoint("auth/v1/logout")?;

        let response = self
            .authorized(self.inner.client.post(url), &session.access_token)
            .send()
            .await?;

        success_body(response).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_conversion() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"8d0f2c1e-4a5b-4c3d-9e8f-1a2b3c4d5e6f","aud":"authenticated","email":"a@x.com"}"#,
        )
        .unwrap();

        let session_user = SessionUser::try_from(user).unwrap();
        assert_eq!(session_user.id.as_str(), "8d0f2c1e-4a5b-4c3d-9e8f-1a2b3c4d5e6f");
        assert_eq!(session_user.email.as_str(), "a@x.com");
    }

    #[test]
    fn test_phone_only_user_is_rejected() {
        let user: AuthUser = serde_json::from_str(r#"{"id":"u1","phone":"+15550100"}"#).unwrap();
        assert!(matches!(
            SessionUser::try_from(user),
            Err(StoreError::InvalidIdentity(_))
        ));
    }
}
