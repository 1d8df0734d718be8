//! Task store.

use std::{collections::HashSet, time::Duration};

use plumber_api::{Ack, CreatedTask, ExecutionApi, NewTask, RunOutcome, TaskApi};
use plumber_core::{
    ExecutionId, Observable, RpcError, StepExecution, Task, TaskExecution, TaskId,
};
use plumber_transport::Transport;
use tokio::{sync::watch, time::MissedTickBehavior};

use crate::state::{StoreState, tracked};

/// Data cached by the task store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskData {
    pub tasks: Vec<Task>,
    /// Execution most recently fetched with [`TaskStore::fetch_execution`].
    pub current_execution: Option<TaskExecution>,
}

/// Cached task list and current execution plus call status.
pub struct TaskStore<T> {
    tasks: TaskApi<T>,
    executions: ExecutionApi<T>,
    state: Observable<StoreState<TaskData>>,
}

impl<T: Transport> TaskStore<T> {
    #[must_use]
    pub fn new(tasks: TaskApi<T>, executions: ExecutionApi<T>) -> Self {
        Self {
            tasks,
            executions,
            state: Observable::default(),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreState<TaskData> {
        self.state.get()
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.state.with(|s| s.data.tasks.clone())
    }

    #[must_use]
    pub fn current_execution(&self) -> Option<TaskExecution> {
        self.state.with(|s| s.data.current_execution.clone())
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.with(StoreState::loading)
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.with(|s| s.error.clone())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState<TaskData>> {
        self.state.subscribe()
    }

    /// Replace the cached task list with the server's.
    ///
    /// # Errors
    /// Returns the call's failure after recording it in the store.
    pub async fn fetch_tasks(&self) -> Result<(), RpcError> {
        tracked(&self.state, async {
            let list = self.tasks.list().await?;
            self.state.update(|s| s.data.tasks = list.tasks);
            Ok(())
        })
        .await
    }

    /// Create a task, then re-fetch the list so server-assigned fields show up.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn create_new_task(&self, task: &NewTask) -> Result<CreatedTask, RpcError> {
        tracked(&self.state, async {
            let created = self.tasks.create(task).await?;
            self.fetch_tasks().await?;
            Ok(created)
        })
        .await
    }

    /// Update a task, then re-fetch the list.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn update_task(&self, id: TaskId, task: &NewTask) -> Result<Ack, RpcError> {
        tracked(&self.state, async {
            let ack = self.tasks.update(id, task).await?;
            self.fetch_tasks().await?;
            Ok(ack)
        })
        .await
    }

    /// Trigger a run, then re-fetch the list to pick up the new status.
    ///
    /// # Errors
    /// Returns the failure of either call after recording it.
    pub async fn execute_task(&self, id: TaskId) -> Result<RunOutcome, RpcError> {
        tracked(&self.state, async {
            let outcome = self.tasks.run(id).await?;
            self.fetch_tasks().await?;
            Ok(outcome)
        })
        .await
    }

    /// Fetch an execution and make it the current one.
    ///
    /// # Errors
    /// Returns the call's failure after recording it.
    pub async fn fetch_execution(&self, id: ExecutionId) -> Result<TaskExecution, RpcError> {
        tracked(&self.state, async {
            let execution = self.executions.get(id).await?;
            let current = execution.clone();
            self.state
                .update(|s| s.data.current_execution = Some(current));
            Ok(execution)
        })
        .await
    }

    /// Re-fetch an execution every `period` until it reaches a final status.
    ///
    /// `on_step` sees each step once, on the first poll where that step is
    /// finished. Transport failures are logged and retried on the next tick.
    ///
    /// # Errors
    /// Returns any other failure (rejected credential, server or protocol
    /// error) as soon as it happens.
    pub async fn follow_execution<F>(
        &self,
        id: ExecutionId,
        period: Duration,
        mut on_step: F,
    ) -> Result<TaskExecution, RpcError>
    where
        F: FnMut(&StepExecution),
    {
        let mut reported = HashSet::new();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let execution = match self.fetch_execution(id).await {
                Ok(execution) => execution,
                Err(RpcError::Transport(e)) => {
                    tracing::warn!(%id, "Failed to poll execution: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for step in &execution.steps {
                if step.status.is_finished() && reported.insert(step.id) {
                    on_step(step);
                }
            }
            if execution.status.is_finished() {
                tracing::debug!(%id, status = %execution.status, "Execution finished");
                return Ok(execution);
            }
        }
    }

    /// Look a task up in the cache. Never touches the network.
    #[must_use]
    pub fn get_task_by_id(&self, id: TaskId) -> Option<Task> {
        self.state
            .with(|s| s.data.tasks.iter().find(|t| t.id == id).cloned())
    }
}
