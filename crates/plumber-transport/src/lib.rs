//! Transport layer of the Plumber client.
//!
//! Provides:
//! - Wire protocol (JSON-RPC 2.0 envelopes)
//! - `RpcClient` - single-shot request/response codec
//! - `SessionGuard` - credential injection and rejection handling
//! - HTTP transport (feature: http)
//! - Scripted mock transport (feature: mock)

pub mod client;
pub mod config;
pub mod guard;
pub mod protocol;
pub mod transport;

#[cfg(feature = "http")]
pub mod http;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::RpcClient;
pub use config::TransportConfig;
pub use guard::{LOGIN_PATH, SessionGuard};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use protocol::{RequestId, RpcRequest, RpcResponse};
pub use transport::{Outbound, Transport};
