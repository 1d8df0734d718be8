//! Server-owned entities as seen by the client.
//!
//! Field names follow the wire format of the Plumber server. Timestamps are
//! RFC 3339 strings on the wire and are decoded into UTC.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agent identifier.
pub type AgentId = Uuid;
/// Task identifier.
pub type TaskId = Uuid;
/// Task execution identifier.
pub type ExecutionId = Uuid;
/// Step execution identifier.
pub type StepId = Uuid;

/// Agent reachability as last reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Online,
    Offline,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Online => "online",
            Self::Offline => "offline",
        })
    }
}

/// Lifecycle state shared by tasks, executions and steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    /// Whether the run has reached a final state.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        })
    }
}

/// SSH authentication mode as named on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshAuthType {
    None,
    Password,
    Key,
}

/// SSH authentication mode together with its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshAuth {
    None,
    Password(String),
    Key(String),
}

impl SshAuth {
    /// Wire name of this mode.
    #[must_use]
    pub const fn kind(&self) -> SshAuthType {
        match self {
            Self::None => SshAuthType::None,
            Self::Password(_) => SshAuthType::Password,
            Self::Key(_) => SshAuthType::Key,
        }
    }
}

/// How the server reaches an agent host over SSH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshDescriptor {
    pub host: String,
    /// `None` lets the server pick its default (22).
    pub port: Option<u16>,
    pub user: String,
    pub auth: SshAuth,
}

impl SshDescriptor {
    /// Descriptor without credentials.
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            user: user.into(),
            auth: SshAuth::None,
        }
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: SshAuth) -> Self {
        self.auth = auth;
        self
    }
}

/// A remote host registered with the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_auth_type: Option<SshAuthType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,
    /// Hostname reported by the agent process itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// IP reported by the agent process itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// The SSH descriptor, if the agent has an SSH host configured.
    #[must_use]
    pub fn ssh(&self) -> Option<SshDescriptor> {
        let host = self.ssh_host.clone().filter(|h| !h.is_empty())?;
        let auth = match self.ssh_auth_type.unwrap_or(SshAuthType::None) {
            SshAuthType::None => SshAuth::None,
            SshAuthType::Password => SshAuth::Password(self.ssh_password.clone().unwrap_or_default()),
            SshAuthType::Key => SshAuth::Key(self.ssh_private_key.clone().unwrap_or_default()),
        };
        Some(SshDescriptor {
            host,
            port: self.ssh_port.filter(|p| *p != 0),
            user: self.ssh_user.clone().unwrap_or_default(),
            auth,
        })
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status == AgentStatus::Online
    }
}

/// A reusable pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Pipeline definition, opaque to the client.
    pub config: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One run of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskExecution {
    pub id: ExecutionId,
    pub task_id: TaskId,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Kept in the order the server returned them (ascending `step_index`).
    #[serde(default)]
    pub steps: Vec<StepExecution>,
}

/// One step of a task execution, bound to a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExecution {
    pub id: StepId,
    pub execution_id: ExecutionId,
    pub step_index: u32,
    pub agent_id: AgentId,
    #[serde(default)]
    pub path: String,
    pub command: String,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
