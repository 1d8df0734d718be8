//! Core building blocks of the Plumber client.
//!
//! This crate provides:
//! - Data model for agents, tasks and executions
//! - `RpcError` - The single error channel for RPC calls
//! - `Observable` - Snapshot cell with change notification
//! - `Session` - Credential state with durable backing
//! - Storage and navigation traits

pub mod error;
pub mod memory;
pub mod models;
pub mod observable;
pub mod session;
pub mod traits;

pub use error::{RpcError, StorageError};
pub use memory::MemoryStore;
pub use models::{
    Agent, AgentId, AgentStatus, ExecutionId, RunStatus, SshAuth, SshAuthType, SshDescriptor,
    StepExecution, StepId, Task, TaskExecution, TaskId,
};
pub use observable::Observable;
pub use session::{Credential, Session};
pub use traits::{KeyValueStore, Navigator};
