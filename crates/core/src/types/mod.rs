//! Core types for Profile Desk.
//!
//! This module provides type-safe wrappers for the profile domain.

pub mod email;
pub mod id;
pub mod profile;
pub mod session;

pub use email::{Email, EmailError};
pub use id::{UserId, UserIdError};
pub use profile::{PROFILE_COLUMNS, PROFILES_TABLE, Profile, ProfileFields, ProfileUpsert};
pub use session::{Session, SessionUser};
