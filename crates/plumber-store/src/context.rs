//! Application context wiring the client together.

use std::sync::Arc;

use plumber_api::PlumberApi;
use plumber_core::{KeyValueStore, Navigator, Session};
use plumber_transport::{RpcClient, SessionGuard, Transport};

use crate::{AgentStore, AuthStore, NavigationGuard, TaskStore};

/// One client instance: session, navigation and the entity stores, all
/// sharing a single guarded RPC client.
pub struct AppContext<T> {
    session: Arc<Session>,
    navigation: Arc<NavigationGuard>,
    pub auth: AuthStore<SessionGuard<T>>,
    pub agents: AgentStore<SessionGuard<T>>,
    pub tasks: TaskStore<SessionGuard<T>>,
}

impl<T: Transport> AppContext<T> {
    /// Restore the session from `storage` and wire the stores onto `transport`.
    #[must_use]
    pub fn new(transport: T, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = Arc::new(Session::restore(storage));
        let navigation = Arc::new(NavigationGuard::new(Arc::clone(&session)));
        let navigator: Arc<dyn Navigator> = Arc::clone(&navigation) as _;

        let guard = SessionGuard::new(transport, Arc::clone(&session), navigator);
        let api = PlumberApi::new(Arc::new(RpcClient::new(guard)));

        Self {
            auth: AuthStore::new(api.auth, Arc::clone(&session)),
            agents: AgentStore::new(api.agents),
            tasks: TaskStore::new(api.tasks, api.executions),
            session,
            navigation,
        }
    }

    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub const fn navigation(&self) -> &Arc<NavigationGuard> {
        &self.navigation
    }
}

#[cfg(feature = "http")]
impl AppContext<plumber_transport::HttpTransport> {
    /// Context talking HTTP to the server described by `config`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn connect(
        config: &plumber_transport::TransportConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, plumber_core::RpcError> {
        let transport = plumber_transport::HttpTransport::new(config)?;
        tracing::debug!(endpoint = transport.endpoint(), "Connecting");
        Ok(Self::new(transport, storage))
    }
}

#[cfg(test)]
mod tests {
    use plumber_api::{agent, auth::LOGIN, task};
    use plumber_core::{MemoryStore, RpcError};
    use plumber_transport::{LOGIN_PATH, mock::MockTransport};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    fn context(storage: Arc<MemoryStore>) -> (AppContext<Arc<MockTransport>>, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        (AppContext::new(Arc::clone(&transport), storage), transport)
    }

    #[tokio::test]
    async fn test_login_then_calls_carry_token() {
        let storage = Arc::new(MemoryStore::new());
        let (ctx, transport) = context(Arc::clone(&storage));
        transport.push_result(
            LOGIN,
            json!({"token": "tok-123", "username": "alice", "user_id": "admin"}),
        );
        transport.push_result(agent::LIST, json!({"agents": []}));

        assert_ok!(ctx.auth.login("alice", "x").await);
        assert_ok!(ctx.agents.fetch_agents().await);

        let calls = transport.calls();
        assert_eq!(calls[0].bearer, None);
        assert_eq!(calls[1].bearer.as_deref(), Some("tok-123"));
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_rejected_credential_returns_to_login() {
        let storage = Arc::new(MemoryStore::with_entries([
            ("token", "stale"),
            ("username", "alice"),
            ("userId", "admin"),
        ]));
        let (ctx, transport) = context(Arc::clone(&storage));
        ctx.navigation().navigate("/tasks");
        assert_eq!(ctx.navigation().current(), "/tasks");
        transport.push_unauthorized(task::LIST);

        let err = assert_err!(ctx.tasks.fetch_tasks().await);
        assert_eq!(err, RpcError::Unauthorized);
        assert!(!ctx.auth.is_logged_in());
        assert!(storage.is_empty());
        assert_eq!(ctx.navigation().current(), LOGIN_PATH);
        assert_eq!(ctx.tasks.error(), Some(RpcError::Unauthorized.to_string()));
        assert!(!ctx.tasks.loading());
    }

    #[tokio::test]
    async fn test_remote_error_surfaces_in_store() {
        let storage = Arc::new(MemoryStore::with_entries([("token", "tok")]));
        let (ctx, transport) = context(storage);
        transport.push_error(agent::DELETE, -32000, "agent not found");

        let err = assert_err!(ctx.agents.delete_agent(uuid::Uuid::nil()).await);
        assert_eq!(err.to_string(), "agent not found");
        assert_eq!(ctx.agents.error().as_deref(), Some("agent not found"));
        assert!(ctx.session().is_logged_in());
    }

    #[test]
    fn test_logged_out_start_redirects_to_login() {
        let (ctx, _transport) = context(Arc::new(MemoryStore::new()));
        ctx.navigation().navigate("/agents");
        assert_eq!(ctx.navigation().current(), LOGIN_PATH);
    }
}
