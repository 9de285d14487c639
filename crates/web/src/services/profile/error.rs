//! Profile operation error types.

use thiserror::Error;

use super::store::StoreError;

/// Errors that can occur while loading or saving a profile.
///
/// All of these are caught at the operation boundary; the caller decides how
/// to present them.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No resolved identity when one was required.
    #[error("no user")]
    NoUser,

    /// Reading the profile failed for a reason other than "no rows".
    #[error("failed to load profile: {0}")]
    Fetch(#[source] StoreError),

    /// Writing the profile failed.
    #[error("failed to update profile: {0}")]
    Write(#[source] StoreError),

    /// The owner was torn down before the operation resolved.
    #[error("operation cancelled")]
    Cancelled,
}
