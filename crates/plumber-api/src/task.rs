//! Task domain.

use std::sync::Arc;

use plumber_core::{ExecutionId, RpcError, Task, TaskId};
use plumber_transport::{RpcClient, Transport};
use serde::{Deserialize, Serialize};

use crate::wire::{Ack, nullable_list};

pub const LIST: &str = "plumber.task.list";
pub const CREATE: &str = "plumber.task.create";
pub const UPDATE: &str = "plumber.task.update";
pub const RUN: &str = "plumber.task.run";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskList {
    #[serde(default, deserialize_with = "nullable_list")]
    pub tasks: Vec<Task>,
}

/// Editable fields of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    /// Pipeline definition, passed through untouched.
    pub config: String,
}

impl NewTask {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        config: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            config: config.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedTask {
    pub task_id: TaskId,
    pub status: String,
}

/// Answer to a run request. The execution itself proceeds asynchronously
/// on the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunOutcome {
    pub status: String,
    #[serde(default)]
    pub message: String,
    /// Execution started by the run, when the server reports it.
    #[serde(default)]
    pub execution_id: Option<ExecutionId>,
}

#[derive(Serialize)]
struct TaskRef {
    task_id: TaskId,
}

#[derive(Serialize)]
struct UpdateParams<'a> {
    task_id: TaskId,
    #[serde(flatten)]
    task: &'a NewTask,
}

/// Client for `plumber.task.*`.
pub struct TaskApi<T> {
    rpc: Arc<RpcClient<T>>,
}

impl<T> Clone for TaskApi<T> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl<T: Transport> TaskApi<T> {
    #[must_use]
    pub const fn new(rpc: Arc<RpcClient<T>>) -> Self {
        Self { rpc }
    }

    /// # Errors
    /// Returns the call's failure.
    pub async fn list(&self) -> Result<TaskList, RpcError> {
        self.rpc.call_without_params(LIST).await
    }

    /// # Errors
    /// Returns the call's failure.
    pub async fn create(&self, task: &NewTask) -> Result<CreatedTask, RpcError> {
        self.rpc.call(CREATE, task).await
    }

    /// Replace name, description and config of a task.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn update(&self, task_id: TaskId, task: &NewTask) -> Result<Ack, RpcError> {
        self.rpc.call(UPDATE, &UpdateParams { task_id, task }).await
    }

    /// Trigger an execution of the task.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn run(&self, task_id: TaskId) -> Result<RunOutcome, RpcError> {
        self.rpc.call(RUN, &TaskRef { task_id }).await
    }
}
