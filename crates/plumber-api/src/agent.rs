//! Agent domain.

use std::sync::Arc;

use plumber_core::{Agent, AgentId, RpcError, SshAuth, SshAuthType, SshDescriptor};
use plumber_transport::{RpcClient, Transport};
use serde::{Deserialize, Serialize};

use crate::wire::{Ack, nullable_list};

pub const LIST: &str = "plumber.agent.list";
pub const CREATE: &str = "plumber.agent.create";
pub const GET_CONFIG: &str = "plumber.agent.getConfig";
pub const UPDATE: &str = "plumber.agent.update";
pub const DELETE: &str = "plumber.agent.delete";
pub const DEPLOY: &str = "plumber.agent.deploy";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentList {
    #[serde(default, deserialize_with = "nullable_list")]
    pub agents: Vec<Agent>,
}

/// Every user-editable field of an agent.
///
/// Used for both create and update; update replaces all fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    pub ssh: Option<SshDescriptor>,
}

impl AgentSpec {
    /// Agent without SSH access.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ssh: None,
        }
    }

    #[must_use]
    pub fn with_ssh(mut self, ssh: SshDescriptor) -> Self {
        self.ssh = Some(ssh);
        self
    }
}

impl From<&Agent> for AgentSpec {
    fn from(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            ssh: agent.ssh(),
        }
    }
}

#[derive(Serialize)]
struct AgentParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<AgentId>,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_user: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_auth_type: Option<SshAuthType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh_private_key: Option<&'a str>,
}

impl<'a> AgentParams<'a> {
    fn new(agent_id: Option<AgentId>, spec: &'a AgentSpec) -> Self {
        let ssh = spec.ssh.as_ref();
        let (password, key) = match ssh.map(|s| &s.auth) {
            Some(SshAuth::Password(p)) => (Some(p.as_str()), None),
            Some(SshAuth::Key(k)) => (None, Some(k.as_str())),
            Some(SshAuth::None) | None => (None, None),
        };
        Self {
            agent_id,
            name: &spec.name,
            ssh_host: ssh.map(|s| s.host.as_str()),
            ssh_port: ssh.and_then(|s| s.port),
            ssh_user: ssh.map(|s| s.user.as_str()),
            ssh_auth_type: ssh.map(|s| s.auth.kind()),
            ssh_password: password,
            ssh_private_key: key,
        }
    }
}

#[derive(Serialize)]
struct AgentRef {
    agent_id: AgentId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedAgent {
    pub agent_id: AgentId,
    pub name: String,
    pub status: String,
}

/// Generated agent configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    pub config: String,
    /// Suggested file name for saving `config`.
    pub filename: String,
}

/// Where to fetch the agent installer and where to install it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployRequest {
    pub script_url: String,
    pub install_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeployResult {
    pub status: String,
    #[serde(default)]
    pub output: String,
}

#[derive(Serialize)]
struct DeployParams<'a> {
    agent_id: AgentId,
    #[serde(flatten)]
    request: &'a DeployRequest,
}

/// Client for `plumber.agent.*`.
pub struct AgentApi<T> {
    rpc: Arc<RpcClient<T>>,
}

impl<T> Clone for AgentApi<T> {
    fn clone(&self) -> Self {
        Self {
            rpc: Arc::clone(&self.rpc),
        }
    }
}

impl<T: Transport> AgentApi<T> {
    #[must_use]
    pub const fn new(rpc: Arc<RpcClient<T>>) -> Self {
        Self { rpc }
    }

    /// List all agents in server order.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn list(&self) -> Result<AgentList, RpcError> {
        self.rpc.call_without_params(LIST).await
    }

    /// Register a new agent.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn create(&self, spec: &AgentSpec) -> Result<CreatedAgent, RpcError> {
        self.rpc.call(CREATE, &AgentParams::new(None, spec)).await
    }

    /// Generate the config file an agent process needs to connect.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn get_config(&self, agent_id: AgentId) -> Result<AgentConfig, RpcError> {
        self.rpc.call(GET_CONFIG, &AgentRef { agent_id }).await
    }

    /// Replace all editable fields of an agent.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn update(&self, agent_id: AgentId, spec: &AgentSpec) -> Result<Ack, RpcError> {
        self.rpc
            .call(UPDATE, &AgentParams::new(Some(agent_id), spec))
            .await
    }

    /// # Errors
    /// Returns the call's failure.
    pub async fn delete(&self, agent_id: AgentId) -> Result<Ack, RpcError> {
        self.rpc.call(DELETE, &AgentRef { agent_id }).await
    }

    /// Install the agent on its host over SSH.
    ///
    /// # Errors
    /// Returns the call's failure.
    pub async fn deploy(
        &self,
        agent_id: AgentId,
        request: &DeployRequest,
    ) -> Result<DeployResult, RpcError> {
        self.rpc
            .call(DEPLOY, &DeployParams { agent_id, request })
            .await
    }
}

#[cfg(test)]
mod tests {
    use plumber_transport::mock::MockTransport;
    use serde_json::{Value, json};
    use tokio_test::{assert_err, assert_ok};
    use uuid::Uuid;

    use super::*;

    const AGENT_ID: &str = "5f0c6a43-2a55-4b8e-9d5e-8f4b3c2a1d00";

    fn api() -> AgentApi<MockTransport> {
        AgentApi::new(Arc::new(RpcClient::new(MockTransport::new())))
    }

    fn agent_id() -> AgentId {
        Uuid::parse_str(AGENT_ID).unwrap()
    }

    fn sent_params(api: &AgentApi<MockTransport>) -> Value {
        api.rpc.transport().calls()[0].envelope.params.clone()
    }

    #[tokio::test]
    async fn test_list_preserves_order() {
        let api = api();
        let agent = |id: &str, name: &str| {
            json!({
                "id": id,
                "name": name,
                "status": "offline",
                "created_at": "2024-04-01T00:00:00Z",
                "updated_at": "2024-04-01T00:00:00Z"
            })
        };
        api.rpc.transport().push_result(
            LIST,
            json!({"agents": [
                agent("00000000-0000-0000-0000-000000000002", "b"),
                agent("00000000-0000-0000-0000-000000000001", "a"),
            ]}),
        );

        let list = assert_ok!(api.list().await);
        let names: Vec<&str> = list.agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(sent_params(&api), json!({}));
    }

    #[tokio::test]
    async fn test_list_accepts_null() {
        let api = api();
        api.rpc.transport().push_result(LIST, json!({"agents": null}));
        assert!(assert_ok!(api.list().await).agents.is_empty());
    }

    #[tokio::test]
    async fn test_create_with_password_ssh() {
        let api = api();
        api.rpc.transport().push_result(
            CREATE,
            json!({"agent_id": AGENT_ID, "name": "web", "status": "created"}),
        );

        let spec = AgentSpec::new("web").with_ssh(
            SshDescriptor::new("10.0.0.5", "root")
                .with_port(22)
                .with_auth(SshAuth::Password("pw".to_string())),
        );
        let created = assert_ok!(api.create(&spec).await);
        assert_eq!(created.agent_id, agent_id());

        assert_eq!(
            sent_params(&api),
            json!({
                "name": "web",
                "ssh_host": "10.0.0.5",
                "ssh_port": 22,
                "ssh_user": "root",
                "ssh_auth_type": "password",
                "ssh_password": "pw"
            })
        );
    }

    #[tokio::test]
    async fn test_create_without_ssh_sends_name_only() {
        let api = api();
        api.rpc.transport().push_result(
            CREATE,
            json!({"agent_id": AGENT_ID, "name": "bare", "status": "created"}),
        );

        assert_ok!(api.create(&AgentSpec::new("bare")).await);
        assert_eq!(sent_params(&api), json!({"name": "bare"}));
    }

    #[tokio::test]
    async fn test_update_sends_id_and_all_fields() {
        let api = api();
        api.rpc.transport().push_result(
            UPDATE,
            json!({"status": "updated", "message": "Agent updated successfully"}),
        );

        let spec = AgentSpec::new("web").with_ssh(
            SshDescriptor::new("h", "u").with_auth(SshAuth::Key("KEY".to_string())),
        );
        let ack = assert_ok!(api.update(agent_id(), &spec).await);
        assert_eq!(ack.status, "updated");

        let params = sent_params(&api);
        assert_eq!(params["agent_id"], AGENT_ID);
        assert_eq!(params["ssh_auth_type"], "key");
        assert_eq!(params["ssh_private_key"], "KEY");
        assert!(params.get("ssh_password").is_none());
    }

    #[tokio::test]
    async fn test_get_config() {
        let api = api();
        api.rpc.transport().push_result(
            GET_CONFIG,
            json!({"config": "{\"id\":\"x\"}", "filename": "agent.json"}),
        );

        let config = assert_ok!(api.get_config(agent_id()).await);
        assert_eq!(config.filename, "agent.json");
        assert_eq!(sent_params(&api), json!({"agent_id": AGENT_ID}));
    }

    #[tokio::test]
    async fn test_delete_unknown_agent() {
        let api = api();
        api.rpc
            .transport()
            .push_error(DELETE, -32000, "agent not found");

        let err = assert_err!(api.delete(agent_id()).await);
        assert_eq!(err.to_string(), "agent not found");
    }

    #[tokio::test]
    async fn test_deploy_flattens_request() {
        let api = api();
        api.rpc
            .transport()
            .push_result(DEPLOY, json!({"status": "success", "output": "ok"}));

        let request = DeployRequest {
            script_url: "https://example.com/install.sh".to_string(),
            install_dir: "/opt/plumber".to_string(),
        };
        let result = assert_ok!(api.deploy(agent_id(), &request).await);
        assert_eq!(result.output, "ok");
        assert_eq!(
            sent_params(&api),
            json!({
                "agent_id": AGENT_ID,
                "script_url": "https://example.com/install.sh",
                "install_dir": "/opt/plumber"
            })
        );
    }
}
