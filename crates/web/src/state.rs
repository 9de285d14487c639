//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{
    AccountController, IdentityProvider, ProfileService, ProfileStore, StoreError,
};
use crate::supabase::SupabaseClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration and the injected store and identity backends.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    profiles: ProfileService,
    identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Create application state backed by the configured Supabase project.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ServerConfig) -> Result<Self, StoreError> {
        let client = Arc::new(SupabaseClient::new(&config.supabase)?);
        Ok(Self::with_backends(config, client.clone(), client))
    }

    /// Create application state over explicit backends.
    #[must_use]
    pub fn with_backends(
        config: ServerConfig,
        store: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                profiles: ProfileService::new(store),
                identity,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the identity provider.
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.inner.identity
    }

    /// A fresh account controller for one request.
    #[must_use]
    pub fn account_controller(&self) -> AccountController {
        AccountController::new(self.inner.profiles.clone(), self.inner.identity.clone())
    }
}
