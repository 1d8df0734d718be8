//! Scripted in-memory transport (feature: mock).
//!
//! Replies are queued per method and consumed in order. Every envelope that
//! reaches the transport is recorded so tests can assert on what was sent.

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use plumber_core::{Navigator, RpcError};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    protocol::RpcResponse,
    transport::{Outbound, Transport},
};

/// Error code the server uses for unknown methods.
pub const METHOD_NOT_FOUND: i64 = -32601;

enum Reply {
    Result(Value),
    Error { code: i64, message: String },
    Envelope(RpcResponse),
    Failure(RpcError),
}

struct Scripted {
    reply: Reply,
    gate: Option<oneshot::Receiver<()>>,
}

/// Holds back a scripted reply until opened.
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Let the held reply through.
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// Transport that answers from a script.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<Outbound>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: &str, reply: Reply, gate: Option<oneshot::Receiver<()>>) {
        if let Ok(mut script) = self.script.lock() {
            script
                .entry(method.to_string())
                .or_default()
                .push_back(Scripted { reply, gate });
        }
    }

    /// Answer the next call to `method` with `result`.
    pub fn push_result(&self, method: &str, result: Value) {
        self.push(method, Reply::Result(result), None);
    }

    /// Answer the next call to `method` with a server error.
    pub fn push_error(&self, method: &str, code: i64, message: &str) {
        self.push(
            method,
            Reply::Error {
                code,
                message: message.to_string(),
            },
            None,
        );
    }

    /// Answer the next call to `method` with a raw envelope.
    pub fn push_envelope(&self, method: &str, envelope: RpcResponse) {
        self.push(method, Reply::Envelope(envelope), None);
    }

    /// Fail the next call to `method` before any envelope is produced.
    pub fn push_failure(&self, method: &str, error: RpcError) {
        self.push(method, Reply::Failure(error), None);
    }

    /// Reject the credential on the next call to `method` (HTTP 401).
    pub fn push_unauthorized(&self, method: &str) {
        self.push_failure(method, RpcError::Unauthorized);
    }

    /// Answer the next call to `method` with `result` once the gate opens.
    #[must_use]
    pub fn push_gated_result(&self, method: &str, result: Value) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(method, Reply::Result(result), Some(rx));
        Gate(tx)
    }

    /// Every request sent so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of requests sent to `method`.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.envelope.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Outbound) -> Result<RpcResponse, RpcError> {
        let id = request.envelope.id.clone();
        let method = request.envelope.method.clone();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request);
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.get_mut(&method).and_then(VecDeque::pop_front));
        let Some(scripted) = next else {
            return Ok(RpcResponse::failure(
                Some(id),
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            ));
        };

        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }

        match scripted.reply {
            Reply::Result(value) => Ok(RpcResponse::success(id, value)),
            Reply::Error { code, message } => Ok(RpcResponse::failure(Some(id), code, message)),
            Reply::Envelope(envelope) => Ok(envelope),
            Reply::Failure(error) => Err(error),
        }
    }
}

/// Navigator that remembers every requested path.
#[derive(Debug, Default)]
pub struct MockNavigator {
    visits: Mutex<Vec<String>>,
}

impl MockNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths navigated to, oldest first.
    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for MockNavigator {
    fn navigate(&self, path: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(path.to_string());
        }
    }
}
