//! Agent store.

use plumber_api::{Ack, AgentApi, AgentConfig, AgentSpec, CreatedAgent};
use plumber_core::{Agent, AgentId, Observable, RpcError};
use plumber_transport::Transport;
use tokio::sync::watch;

use crate::state::{StoreState, tracked};

/// Cached agent list plus call status.
pub struct AgentStore<T> {
    api: AgentApi<T>,
    state: Observable<StoreState<Vec<Agent>>>,
}

impl<T: Transport> AgentStore<T> {
    #[must_use]
    pub fn new(api: AgentApi<T>) -> Self {
        Self {
            api,
            state: Observable::default(),
        }
    }

    /// Consistent snapshot of agents, loading and error.
    #[must_use]
    pub fn snapshot(&self) -> StoreState<Vec<Agent>> {
        self.state.get()
    }

    #[must_use]
    pub fn agents(&self) -> Vec<Agent> {
        self.state.with(|s| s.data.clone())
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.with(StoreState::loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.with(|s| s.error.clone())
    }

    /// Watch the store for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState<Vec<Agent>>> {
        self.state.subscribe()
    }

    /// Replace the cached list with the server's.
    ///
    /// # Errors
    /// Returns the call's failure after recording it in the store.
    pub async fn fetch_agents(&self) -> Result<(), RpcError> {
        tracked(&self.state, async {
            let list = self.api.list().await?;
            self.state.update(|s| s.data = list.agents);
            Ok(())
        })
        .await
    }

    /// Look an agent up in the cache. Never touches the network.
    #[must_use]
    pub fn get_agent_by_id(&self, id: AgentId) -> Option<Agent> {
        self.state
            .with(|s| s.data.iter().find(|a| a.id == id).cloned())
    }

    /// Register an agent, then re-fetch the list.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn create_agent(&self, spec: &AgentSpec) -> Result<CreatedAgent, RpcError> {
        tracked(&self.state, async {
            let created = self.api.create(spec).await?;
            self.fetch_agents().await?;
            Ok(created)
        })
        .await
    }

    /// Replace an agent's fields, then re-fetch the list.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn update_agent(&self, id: AgentId, spec: &AgentSpec) -> Result<Ack, RpcError> {
        tracked(&self.state, async {
            let ack = self.api.update(id, spec).await?;
            self.fetch_agents().await?;
            Ok(ack)
        })
        .await
    }

    /// Delete an agent, then re-fetch the list.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn delete_agent(&self, id: AgentId) -> Result<Ack, RpcError> {
        tracked(&self.state, async {
            let ack = self.api.delete(id).await?;
            self.fetch_agents().await?;
            Ok(ack)
        })
        .await
    }

    /// Fetch the generated config of an agent. The cache is left as is.
    ///
    /// # Errors
    /// Returns the call's failure after recording it.
    pub async fn fetch_agent_config(&self, id: AgentId) -> Result<AgentConfig, RpcError> {
        tracked(&self.state, self.api.get_config(id)).await
    }
}
