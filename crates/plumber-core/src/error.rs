//! Error taxonomy shared by every layer of the client.

use serde_json::Value;
use thiserror::Error;

/// Message used when an envelope carries neither `result` nor `error`.
pub const NO_RESULT: &str = "no result in response";

/// Failure of a single RPC call.
///
/// The transport normalizes every failure into this type; domain clients pass
/// it through unchanged and stores both record and return it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// No usable envelope was produced (network failure, timeout, bad body).
    #[error("{0}")]
    Transport(String),
    /// The server answered with a structured `error` object.
    #[error("{message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    /// Well-formed envelope that broke the contract (missing or mistyped result).
    #[error("{0}")]
    Protocol(String),
    /// The server rejected the held credential (HTTP 401).
    #[error("unauthorized: credential rejected")]
    Unauthorized,
}

impl RpcError {
    /// Build a transport failure from any displayable cause.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Server error code, when the server produced one.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Credential storage failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt storage: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}
