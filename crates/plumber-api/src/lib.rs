//! Typed domain clients for the Plumber server.
//!
//! One client per server-side domain. Each operation is a thin pass-through
//! to [`RpcClient`] with a fixed method name and typed params/result; none of
//! them retry, cache or validate business rules.

pub mod agent;
pub mod auth;
pub mod execution;
pub mod task;
pub mod wire;

use std::sync::Arc;

use plumber_transport::{RpcClient, Transport};

pub use agent::{AgentApi, AgentConfig, AgentList, AgentSpec, CreatedAgent, DeployRequest, DeployResult};
pub use auth::{AuthApi, Login, LoginResult};
pub use execution::ExecutionApi;
pub use task::{CreatedTask, NewTask, RunOutcome, TaskApi, TaskList};
pub use wire::Ack;

/// All domain clients sharing one RPC client.
pub struct PlumberApi<T> {
    pub auth: AuthApi<T>,
    pub agents: AgentApi<T>,
    pub tasks: TaskApi<T>,
    pub executions: ExecutionApi<T>,
}

impl<T: Transport> PlumberApi<T> {
    #[must_use]
    pub fn new(rpc: Arc<RpcClient<T>>) -> Self {
        Self {
            auth: AuthApi::new(Arc::clone(&rpc)),
            agents: AgentApi::new(Arc::clone(&rpc)),
            tasks: TaskApi::new(Arc::clone(&rpc)),
            executions: ExecutionApi::new(rpc),
        }
    }
}
