//! Compute instance

use serde::{Deserialize, Serialize};
use std::fmt;

/// Public SSM parameter resolving to the latest Amazon Linux 2 AMI
pub const AMAZON_LINUX_2_PARAMETER: &str =
    "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2";

/// Instance type split into class and size (`t3a` + `medium`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceType {
    pub class: String,
    pub size: String,
}

impl InstanceType {
    pub fn of(class: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            size: size.into(),
        }
    }

    /// Parse `class.size`
    pub fn parse(s: &str) -> Option<Self> {
        let (class, size) = s.split_once('.')?;
        if class.is_empty() || size.is_empty() {
            return None;
        }
        Some(Self::of(class, size))
    }
}

impl Default for InstanceType {
    fn default() -> Self {
        Self::of("t3a", "medium")
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.size)
    }
}

/// Machine image looked up at deploy time through an SSM parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    pub parameter_name: String,
}

impl Default for MachineImage {
    fn default() -> Self {
        Self {
            parameter_name: AMAZON_LINUX_2_PARAMETER.to_string(),
        }
    }
}

/// The single virtual machine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub instance_type: InstanceType,
    pub image: MachineImage,
}
