//! User identifiers.
//!
//! The identity provider issues user IDs; this crate never mints them. They
//! are treated as opaque strings so the same type works for UUID-style
//! Supabase IDs and the short IDs used in tests.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`UserId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserIdError {
    /// The input string is empty or only whitespace.
    #[error("user id cannot be empty")]
    Empty,
}

/// Identifier of an authenticated principal.
///
/// A profile row's `id` always equals the `UserId` of the session that
/// wrote it.
///
/// ```
/// use profile_desk_core::UserId;
///
/// let id = UserId::parse("u1").unwrap();
/// assert_eq!(id.as_str(), "u1");
/// assert!(UserId::parse("  ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parse a `UserId`, rejecting blank input.
    ///
    /// # Errors
    ///
    /// Returns [`UserIdError::Empty`] if the input is empty or whitespace.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(UserIdError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = UserIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
