//! Secret reference and the instance identity

use serde::{Deserialize, Serialize};

/// Actions granted on the secret parameter
pub const PARAMETER_READ_ACTIONS: [&str; 4] = [
    "ssm:DescribeParameters",
    "ssm:GetParameters",
    "ssm:GetParameter",
    "ssm:GetParameterHistory",
];

/// Managed policy that lets Systems Manager manage the instance
pub const REMOTE_MANAGEMENT_POLICY: &str = "AmazonSSMManagedInstanceCore";

/// Named SecureString parameter in the parameter store
///
/// Only the name is declared. The value never appears in the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub parameter_name: String,
}

impl SecretRef {
    pub fn new(parameter_name: impl Into<String>) -> Self {
        Self {
            parameter_name: parameter_name.into(),
        }
    }

    /// Resource suffix used in the parameter ARN (`parameter/<name>`)
    pub fn arn_resource(&self) -> String {
        if self.parameter_name.starts_with('/') {
            format!("parameter{}", self.parameter_name)
        } else {
            format!("parameter/{}", self.parameter_name)
        }
    }
}

impl Default for SecretRef {
    fn default() -> Self {
        Self::new("/valheim/server-password")
    }
}

/// Role assumed by the compute instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Service principal allowed to assume the role
    pub assumed_by: String,

    /// AWS managed policies attached by name
    pub managed_policies: Vec<String>,
}

impl Default for InstanceIdentity {
    fn default() -> Self {
        Self {
            assumed_by: "ec2.amazonaws.com".to_string(),
            managed_policies: vec![REMOTE_MANAGEMENT_POLICY.to_string()],
        }
    }
}
