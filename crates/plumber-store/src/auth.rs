//! Auth store: login, logout and the current identity.

use std::sync::Arc;

use plumber_api::{AuthApi, Login, LoginResult};
use plumber_core::{Credential, KeyValueStore, RpcError, Session, StorageError};
use plumber_transport::Transport;
use tokio::sync::watch;

/// Auth store error.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error("Failed to store credential: {0}")]
    Storage(#[from] StorageError),
}

/// Login state backed by the shared [`Session`].
pub struct AuthStore<T> {
    api: AuthApi<T>,
    session: Arc<Session>,
}

impl<T: Transport> AuthStore<T> {
    #[must_use]
    pub const fn new(api: AuthApi<T>, session: Arc<Session>) -> Self {
        Self { api, session }
    }

    /// Store over a session restored from `storage`.
    #[must_use]
    pub fn restore(api: AuthApi<T>, storage: Arc<dyn KeyValueStore>) -> Self {
        Self::new(api, Arc::new(Session::restore(storage)))
    }

    /// Log in and persist the issued credential.
    ///
    /// On failure the previously held credential is kept.
    ///
    /// # Errors
    /// Returns error if the server rejects the login or the credential
    /// cannot be persisted.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let result = self.api.login(&Login::new(username, password)).await?;
        self.session.establish(result.clone().into())?;
        tracing::info!(username = %result.username, "Logged in");
        Ok(result)
    }

    /// Drop the credential locally. The server is not contacted.
    ///
    /// # Errors
    /// Returns error if durable storage could not be cleared.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.session.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    #[must_use]
    pub fn credential(&self) -> Credential {
        self.session.credential()
    }

    #[must_use]
    pub fn username(&self) -> String {
        self.session.credential().username
    }

    #[must_use]
    pub fn user_id(&self) -> String {
        self.session.credential().user_id
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Watch the credential for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Credential> {
        self.session.subscribe()
    }
}
