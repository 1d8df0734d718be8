//! Execution domain.

use std::sync::Arc;

use plumber_core::{ExecutionId, RpcError, TaskExecution};
use plumber_transport::{RpcClient, Transport};
use serde::{Deserialize, Serialize};

pub const GET: &str = "plumber.execution.get";

#[derive(Serialize)]
struct ExecutionRef {
    execution_id: ExecutionId,
}

#[derive(Deserialize)]
struct ExecutionEnvelope {
    execution: TaskExecution,
}

/// Client for `plumber.execution.*`.
pub struct ExecutionApi<T> {
    rpc: Arc<RpcClient<T>>,
}

impl<T> Clone for ExecutionApi<T> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl<T: Transport> ExecutionApi<T> {
    #[must_use]
    pub const fn new(rpc: Arc<RpcClient<T>>) -> Self {
        Self { rpc }
    }

    /// Fetch an execution with its steps in server order.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn get(&self, execution_id: ExecutionId) -> Result<TaskExecution, RpcError> {
        let envelope: ExecutionEnvelope = self.rpc.call(GET, &ExecutionRef { execution_id }).await?;
        Ok(envelope.execution)
    }
}

#[cfg(test)]
mod tests {
    use plumber_core::RunStatus;
    use plumber_transport::mock::MockTransport;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    use super::*;

    const EXECUTION_ID: &str = "00000000-0000-0000-0000-0000000000e1";

    fn step(index: u32, status: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "execution_id": EXECUTION_ID,
            "step_index": index,
            "agent_id": "00000000-0000-0000-0000-0000000000a1",
            "path": "/srv/app",
            "command": format!("step-{index}"),
            "status": status,
            "created_at": "2024-04-01T00:00:00Z",
            "updated_at": "2024-04-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_get_keeps_steps_in_server_order() {
        let api = ExecutionApi::new(Arc::new(RpcClient::new(MockTransport::new())));
        api.rpc.transport().push_result(
            GET,
            json!({"execution": {
                "id": EXECUTION_ID,
                "task_id": "00000000-0000-0000-0000-0000000000f1",
                "status": "failed",
                "start_time": "2024-04-01T00:00:01Z",
                "end_time": "2024-04-01T00:00:09Z",
                "created_at": "2024-04-01T00:00:00Z",
                "updated_at": "2024-04-01T00:00:09Z",
                "steps": [step(0, "success"), step(1, "failed"), step(2, "pending")]
            }}),
        );

        let id = Uuid::parse_str(EXECUTION_ID).unwrap();
        let execution = assert_ok!(api.get(id).await);
        assert_eq!(execution.status, RunStatus::Failed);
        let order: Vec<(u32, RunStatus)> = execution
            .steps
            .iter()
            .map(|s| (s.step_index, s.status))
            .collect();
        assert_eq!(
            order,
            vec![
                (0, RunStatus::Success),
                (1, RunStatus::Failed),
                (2, RunStatus::Pending)
            ]
        );
        assert_eq!(
            api.rpc.transport().calls()[0].envelope.params,
            json!({"execution_id": EXECUTION_ID})
        );
    }

    #[tokio::test]
    async fn test_missing_execution_is_protocol_error() {
        let api = ExecutionApi::new(Arc::new(RpcClient::new(MockTransport::new())));
        api.rpc.transport().push_result(GET, json!({}));

        let err = assert_err!(api.get(Uuid::nil()).await);
        assert!(matches!(err, RpcError::Protocol(_)));
    }
}
