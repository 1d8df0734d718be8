//! Request/response codec on top of a [`Transport`].

use plumber_core::RpcError;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    protocol::{RequestIds, RpcRequest},
    transport::{Outbound, Transport},
};

/// Performs one round trip per call and decodes the result.
///
/// No retries and no batching: each call builds exactly one envelope with a
/// fresh id.
pub struct RpcClient<T> {
    transport: T,
    ids: RequestIds,
}

impl<T: Transport> RpcClient<T> {
    /// Create a client over `transport`.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            ids: RequestIds::new(),
        }
    }

    /// The wrapped transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Call `method` and return the raw result value.
    ///
    /// # Errors
    /// Returns the transport, remote or protocol failure of the call.
    pub async fn call_value(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        let envelope = RpcRequest::new(self.ids.next_id(), method, params);
        tracing::debug!(method, id = %envelope.id, "rpc call");

        let response = self.transport.send(Outbound::new(envelope)).await?;
        response.into_result()
    }

    /// Call `method` with typed params and decode the result into `R`.
    ///
    /// # Errors
    /// Returns the call's failure, or `Protocol` if the result does not have
    /// the expected shape.
    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RpcError>
    where
        P: Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| RpcError::Transport(format!("failed to encode params for {method}: {e}")))?;
        let value = self.call_value(method, Some(params)).await?;
        decode(method, value)
    }

    /// Call a method that takes no params.
    ///
    /// # Errors
    /// Same as [`RpcClient::call`].
    pub async fn call_without_params<R: DeserializeOwned>(&self, method: &str) -> Result<R, RpcError> {
        let value = self.call_value(method, None).await?;
        decode(method, value)
    }
}

fn decode<R: DeserializeOwned>(method: &str, value: Value) -> Result<R, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::Protocol(format!("unexpected result for {method}: {e}")))
}
