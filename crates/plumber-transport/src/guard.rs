//! Credential injection and rejection handling for every call.

use std::sync::Arc;

use async_trait::async_trait;
use plumber_core::{Navigator, RpcError, Session};

use crate::{
    protocol::RpcResponse,
    transport::{Outbound, Transport},
};

/// Login entry point the user is sent to after a credential rejection.
pub const LOGIN_PATH: &str = "/login";

/// Transport decorator that binds the session to each call.
///
/// Before sending, the held bearer token (if any) is attached. When the
/// server rejects the credential the guard destroys it, forces navigation to
/// [`LOGIN_PATH`] and still returns the failure to the caller. There is no
/// refresh, so the call is never retried.
pub struct SessionGuard<T> {
    inner: T,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
}

impl<T: Transport> SessionGuard<T> {
    #[must_use]
    pub fn new(inner: T, session: Arc<Session>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner,
            session,
            navigator,
        }
    }

    /// The session this guard reads from.
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The wrapped transport.
    pub const fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Transport> Transport for SessionGuard<T> {
    async fn send(&self, mut request: Outbound) -> Result<RpcResponse, RpcError> {
        if let Some(token) = self.session.token() {
            request.bearer = Some(token);
        }

        let result = self.inner.send(request).await;
        if matches!(result, Err(RpcError::Unauthorized)) {
            tracing::warn!("Credential rejected by server, returning to login");
            self.session.invalidate();
            self.navigator.navigate(LOGIN_PATH);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use plumber_core::Credential;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::{
        client::RpcClient,
        mock::{MockNavigator, MockTransport},
    };

    fn guarded(
        session: Session,
    ) -> (RpcClient<SessionGuard<Arc<MockTransport>>>, Arc<MockTransport>, Arc<MockNavigator>) {
        let transport = Arc::new(MockTransport::new());
        let navigator = Arc::new(MockNavigator::new());
        let guard = SessionGuard::new(Arc::clone(&transport), Arc::new(session), navigator.clone());
        (RpcClient::new(guard), transport, navigator)
    }

    fn logged_in() -> Session {
        let session = Session::in_memory();
        assert_ok!(session.establish(Credential::new("tok-123", "alice", "admin")));
        session
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_logged_in() {
        let (client, transport, _) = guarded(logged_in());
        transport.push_result("plumber.agent.list", json!({"agents": []}));

        assert_ok!(client.call_value("plumber.agent.list", None).await);
        assert_eq!(transport.calls()[0].bearer.as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_no_bearer_when_logged_out() {
        let (client, transport, _) = guarded(Session::in_memory());
        transport.push_result("plumber.user.login", json!({}));

        assert_ok!(client.call_value("plumber.user.login", None).await);
        assert_eq!(transport.calls()[0].bearer, None);
    }

    #[tokio::test]
    async fn test_rejection_clears_credential_and_redirects_once() {
        let (client, transport, navigator) = guarded(logged_in());
        transport.push_unauthorized("plumber.task.list");

        let err = assert_err!(client.call_value("plumber.task.list", None).await);
        assert!(err.is_unauthorized());

        let session = client.transport().session();
        assert!(!session.is_logged_in());
        assert_eq!(session.credential(), Credential::default());
        assert_eq!(navigator.visits(), vec![LOGIN_PATH.to_string()]);
        assert_eq!(transport.call_count("plumber.task.list"), 1);
    }

    #[tokio::test]
    async fn test_next_call_after_rejection_is_anonymous() {
        let (client, transport, _) = guarded(logged_in());
        transport.push_unauthorized("plumber.task.list");
        transport.push_result("plumber.task.list", json!({"tasks": []}));

        assert_err!(client.call_value("plumber.task.list", None).await);
        assert_ok!(client.call_value("plumber.task.list", None).await);
        assert_eq!(transport.calls()[1].bearer, None);
    }

    #[tokio::test]
    async fn test_remote_errors_keep_credential() {
        let (client, transport, navigator) = guarded(logged_in());
        transport.push_error("plumber.agent.delete", -32000, "agent not found");

        assert_err!(client.call_value("plumber.agent.delete", None).await);
        assert!(client.transport().session().is_logged_in());
        assert!(navigator.visits().is_empty());
    }
}
