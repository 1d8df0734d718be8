//! Authentication domain.

use std::{fmt, sync::Arc};

use plumber_core::{Credential, RpcError};
use plumber_transport::{RpcClient, Transport};
use serde::{Deserialize, Serialize};

pub const LOGIN: &str = "plumber.user.login";

/// Login form.
#[derive(Clone, Serialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

impl Login {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Token and identity issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResult {
    pub token: String,
    pub username: String,
    pub user_id: String,
}

impl From<LoginResult> for Credential {
    fn from(result: LoginResult) -> Self {
        Self::new(result.token, result.username, result.user_id)
    }
}

/// Client for `plumber.user.*`.
pub struct AuthApi<T> {
    rpc: Arc<RpcClient<T>>,
}

impl<T> Clone for AuthApi<T> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl<T: Transport> AuthApi<T> {
    #[must_use]
    pub const fn new(rpc: Arc<RpcClient<T>>) -> Self {
        Self { rpc }
    }

    /// Exchange username and password for a credential.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn login(&self, login: &Login) -> Result<LoginResult, RpcError> {
        tracing::debug!(username = %login.username, "login");
        self.rpc.call(LOGIN, login).await
    }
}
