//! HTTP transport (feature: http).

use async_trait::async_trait;
use plumber_core::RpcError;
use reqwest::StatusCode;

use crate::{
    config::TransportConfig,
    protocol::RpcResponse,
    transport::{Outbound, Transport},
};

/// Posts envelopes to the server's single RPC endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from `config`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn new(config: &TransportConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(RpcError::transport)?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }

    /// Endpoint URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Outbound) -> Result<RpcResponse, RpcError> {
        let mut builder = self.client.post(&self.endpoint).json(&request.envelope);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Transport(format!("request timed out: {e}"))
            } else {
                RpcError::transport(e)
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RpcError::Unauthorized);
        }
        if !status.is_success() {
            return Err(RpcError::Transport(format!(
                "request failed with status {status}"
            )));
        }

        response
            .json::<RpcResponse>()
            .await
            .map_err(|e| RpcError::Transport(format!("malformed response envelope: {e}")))
    }
}
