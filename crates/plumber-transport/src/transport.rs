//! The single-envelope exchange seam.

use std::sync::Arc;

use async_trait::async_trait;
use plumber_core::RpcError;

use crate::protocol::{RpcRequest, RpcResponse};

/// One outbound envelope plus the credential to present with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub envelope: RpcRequest,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<String>,
}

impl Outbound {
    /// Envelope without a credential.
    #[must_use]
    pub const fn new(envelope: RpcRequest) -> Self {
        Self {
            envelope,
            bearer: None,
        }
    }
}

/// Sends exactly one envelope and returns exactly one response.
///
/// Implementations never retry. An HTTP 401 must surface as
/// [`RpcError::Unauthorized`]; every other failure to obtain an envelope is a
/// [`RpcError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Exchange one envelope.
    async fn send(&self, request: Outbound) -> Result<RpcResponse, RpcError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Outbound) -> Result<RpcResponse, RpcError> {
        (**self).send(request).await
    }
}
