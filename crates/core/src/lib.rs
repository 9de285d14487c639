//! Profile Desk Core - Shared types library.
//!
//! This crate provides the types used across all Profile Desk components:
//! - `web` - Account page server and the profile synchronization services
//! - `cli` - Command-line access to the same profile operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The profile
//! store and identity provider are traits in the `web` crate; everything here
//! is plain data that can be constructed in tests without a backend.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, emails, sessions and profile records
//! - [`edit_state`] - In-memory edit state for the account form

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod edit_state;
pub mod types;

pub use edit_state::EditState;
pub use types::*;
