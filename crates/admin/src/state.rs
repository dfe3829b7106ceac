//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{BackendClient, BackendError};
use crate::config::DeskConfig;
use crate::session::CallbackGuard;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DeskConfig,
    backend: BackendClient,
    callback_guard: CallbackGuard,
}

impl AppState {
    /// Build state for `config`, creating the backend client.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Client` if the HTTP client cannot be built.
    pub fn new(config: DeskConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(config.api_url.clone())?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                callback_guard: CallbackGuard::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DeskConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// In-flight callback codes.
    #[must_use]
    pub fn callback_guard(&self) -> &CallbackGuard {
        &self.inner.callback_guard
    }
}
