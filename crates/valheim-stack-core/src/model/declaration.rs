//! Whole provisioning declaration

use super::access::IngressRule;
use super::backup::BackupSpec;
use super::bootstrap::{BootstrapScript, GameServer};
use super::compute::InstanceSpec;
use super::identity::{InstanceIdentity, SecretRef};
use super::network::NetworkSpec;
use serde::{Deserialize, Serialize};

/// Desired infrastructure state handed to the provisioning engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub stack_name: String,
    pub description: Option<String>,
    pub network: NetworkSpec,
    pub ingress: IngressRule,
    pub secret: SecretRef,
    pub identity: InstanceIdentity,
    pub instance: InstanceSpec,
    pub server: GameServer,
    pub backup: BackupSpec,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            stack_name: "ValheimDedicatedServerStack".to_string(),
            description: None,
            network: NetworkSpec::default(),
            ingress: IngressRule::default(),
            secret: SecretRef::default(),
            identity: InstanceIdentity::default(),
            instance: InstanceSpec::default(),
            server: GameServer::default(),
            backup: BackupSpec::default(),
        }
    }
}

impl Declaration {
    /// Bootstrap script derived from the server, secret and port settings
    pub fn bootstrap_script(&self) -> BootstrapScript {
        BootstrapScript::for_server(&self.server, &self.secret, &self.ingress)
    }
}
