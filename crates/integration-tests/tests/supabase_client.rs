//! Integration tests for the Supabase client.
//!
//! Runs `SupabaseClient` against the in-process fake project.
//!
//! Run with: cargo test -p profile-desk-integration-tests

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use profile_desk_core::{ProfileFields, ProfileUpsert, Session, UserId};
use profile_desk_integration_tests::{ANON_KEY, FakeSupabase, supabase_config};
use profile_desk_web::SupabaseClient;
use profile_desk_web::services::{IdentityProvider, ProfileStore, StoreError};
use secrecy::SecretString;
use serde_json::json;

/// Bob's write payload at a fixed time.
fn stamp(id: &str) -> ProfileUpsert {
    ProfileUpsert {
        id: UserId::parse(id).unwrap(),
        fields: ProfileFields {
            username: Some("bob".to_string()),
            website: Some("https://b.io".to_string()),
            avatar_url: None,
        },
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

async fn client_for(fake: &FakeSupabase) -> SupabaseClient {
    let url = fake.spawn().await;
    SupabaseClient::new(&supabase_config(url)).unwrap()
}

async fn session(client: &SupabaseClient, token: &str) -> Session {
    let token = SecretString::from(token);
    let user = client.resolve_user(&token).await.unwrap();
    Session::new(token, user)
}

#[tokio::test]
async fn test_resolve_user() {
    let fake = FakeSupabase::default().with_user("jwt-alice", "u1", "a@x.com");
    let client = client_for(&fake).await;

    let user = client
        .resolve_user(&SecretString::from("jwt-alice"))
        .await
        .unwrap();

    assert_eq!(user.id.as_str(), "u1");
    assert_eq!(user.email.as_str(), "a@x.com");

    let request = &fake.requests()[0];
    assert_eq!(request.apikey.as_deref(), Some(ANON_KEY));
    assert_eq!(request.authorization.as_deref(), Some("Bearer jwt-alice"));
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let fake = FakeSupabase::default();
    let client = client_for(&fake).await;

    let result = client.resolve_user(&SecretString::from("forged")).await;

    assert!(matches!(result, Err(StoreError::Unauthorized)));
}

#[tokio::test]
async fn test_fetch_one_selects_profile_columns() {
    let fake = FakeSupabase::default()
        .with_user("jwt-alice", "u1", "a@x.com")
        .with_row("u1", &json!({"username": "alice", "website": null, "avatar_url": null}));
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-alice").await;

    let fields = client
        .fetch_one(&session, &UserId::parse("u1").unwrap())
        .await
        .unwrap();

    assert_eq!(
        fields,
        ProfileFields {
            username: Some("alice".to_string()),
            website: None,
            avatar_url: None,
        }
    );

    let request = fake.requests().pop().unwrap();
    assert_eq!(request.path, "/rest/v1/profiles");
    assert_eq!(request.query["select"], "username,website,avatar_url");
    assert_eq!(request.query["id"], "eq.u1");
    assert_eq!(
        request.accept.as_deref(),
        Some("application/vnd.pgrst.object+json")
    );
}

#[tokio::test]
async fn test_fetch_one_missing_row_is_not_found() {
    let fake = FakeSupabase::default().with_user("jwt-u2", "u2", "u2@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-u2").await;

    let result = client
        .fetch_one(&session, &UserId::parse("u2").unwrap())
        .await;

    assert!(matches!(result, Err(StoreError::NotFound)));
}

#[tokio::test]
async fn test_upsert_returns_stored_row() {
    let fake = FakeSupabase::default().with_user("jwt-bob", "u3", "b@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-bob").await;
    let record = stamp("u3");

    let profile = client.upsert(&session, &record).await.unwrap();

    assert_eq!(profile.id.as_str(), "u3");
    assert_eq!(profile.fields.username.as_deref(), Some("bob"));
    assert_eq!(profile.fields.website.as_deref(), Some("https://b.io"));
    assert_eq!(profile.updated_at, Some(record.updated_at));

    let request = fake.requests().pop().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.query["on_conflict"], "id");
    assert_eq!(
        request.prefer.as_deref(),
        Some("resolution=merge-duplicates,return=representation")
    );
    assert_eq!(request.body.unwrap()["avatar_url"], json!(null));

    let row = fake.row("u3").unwrap();
    assert_eq!(row["username"], json!("bob"));
}

#[tokio::test]
async fn test_upsert_is_idempotent() {
    let fake = FakeSupabase::default().with_user("jwt-bob", "u3", "b@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-bob").await;
    let record = stamp("u3");

    let first = client.upsert(&session, &record).await.unwrap();
    let second = client.upsert(&session, &record).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fake.row("u3").unwrap()["username"], json!("bob"));
}

#[tokio::test]
async fn test_upsert_for_other_user_is_unauthorized() {
    let fake = FakeSupabase::default().with_user("jwt-bob", "u3", "b@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-bob").await;

    let result = client.upsert(&session, &stamp("u1")).await;

    assert!(matches!(result, Err(StoreError::Unauthorized)));
    assert!(fake.row("u1").is_none());
}

#[tokio::test]
async fn test_server_error_is_rejected_with_message() {
    let fake = FakeSupabase::default().with_user("jwt-alice", "u1", "a@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-alice").await;
    fake.fail_rest_with(axum::http::StatusCode::SERVICE_UNAVAILABLE);

    let result = client
        .fetch_one(&session, &UserId::parse("u1").unwrap())
        .await;

    match result {
        Err(StoreError::Rejected { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sign_out_revokes_token() {
    let fake = FakeSupabase::default().with_user("jwt-alice", "u1", "a@x.com");
    let client = client_for(&fake).await;
    let session = session(&client, "jwt-alice").await;

    client.sign_out(&session).await.unwrap();

    assert!(fake.is_revoked("jwt-alice"));
    assert!(matches!(
        client.resolve_user(&SecretString::from("jwt-alice")).await,
        Err(StoreError::Unauthorized)
    ));
}
