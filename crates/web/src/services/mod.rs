//! Business logic services.
//!
//! # Services
//!
//! - `profile` - Load/save of the current user's profile row through an
//!   injected store, plus the store and identity ports
//! - `account` - The account form controller: edit state, busy flag,
//!   session changes, teardown and sign-out

pub mod account;
pub mod profile;

pub use account::{AccountController, LoadOutcome};
pub use profile::{IdentityProvider, ProfileError, ProfileService, ProfileStore, StoreError};
