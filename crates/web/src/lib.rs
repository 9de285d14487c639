//! Profile Desk account page.
//!
//! Serves the account form for a user whose session was handed over by the
//! hosting shell, and keeps the form in sync with the `profiles` table.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for the update button
//! - Askama templates for server-side rendering
//! - Supabase PostgREST for profile rows, GoTrue for identity
//! - In-memory cookie sessions holding the handed-off access token
//!
//! The [`services`] layer is transport-agnostic and is also driven by the
//! `pd-cli` binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod supabase;

pub use config::{ConfigError, ServerConfig, SupabaseConfig};
pub use state::AppState;
pub use supabase::SupabaseClient;
