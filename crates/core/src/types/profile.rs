//! Profile records.
//!
//! A profile is the per-user row in the `profiles` table. The account form
//! only ever reads and writes three columns of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Name of the table holding profile rows.
pub const PROFILES_TABLE: &str = "profiles";

/// Columns selected when loading a profile into the form.
pub const PROFILE_COLUMNS: [&str; 3] = ["username", "website", "avatar_url"];

/// The editable fields of a profile.
///
/// `None` is the unset sentinel: a missing or `null` column deserializes to
/// `None`, and `None` serializes back as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    /// Display name chosen by the user.
    #[serde(default)]
    pub username: Option<String>,
    /// Personal website; not validated as a URL.
    #[serde(default)]
    pub website: Option<String>,
    /// Public URL of the avatar image.
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A stored profile row as acknowledged by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Owner of the row; equals the session's user ID.
    pub id: UserId,
    /// Editable columns.
    #[serde(flatten)]
    pub fields: ProfileFields,
    /// When the row was last written.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Insert-or-update payload keyed on `id`.
///
/// Serializes to the flat shape the store expects:
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use profile_desk_core::{ProfileFields, ProfileUpsert, UserId};
///
/// let upsert = ProfileUpsert {
///     id: UserId::parse("u1").unwrap(),
///     fields: ProfileFields {
///         username: Some("bob".to_owned()),
///         website: Some("http://b.com".to_owned()),
///         avatar_url: None,
///     },
///     updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
/// };
/// let json = serde_json::to_value(&upsert).unwrap();
/// assert_eq!(json["id"], "u1");
/// assert_eq!(json["avatar_url"], serde_json::Value::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpsert {
    /// Row key; always the writing session's user ID.
    pub id: UserId,
    /// Values to store.
    #[serde(flatten)]
    pub fields: ProfileFields,
    /// Write timestamp.
    pub updated_at: DateTime<Utc>,
}

impl ProfileUpsert {
    /// The row the store holds after applying this upsert.
    #[must_use]
    pub fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            fields: self.fields,
            updated_at: Some(self.updated_at),
        }
    }
}
