//! Network boundary

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Subnet kinds that may be declared
///
/// Only public subnets exist; the server is reached directly over the internet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubnetType {
    #[default]
    Public,
}

impl SubnetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "Public",
        }
    }
}

/// Isolated network with a single public address range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// VPC address range
    pub cidr: String,

    /// Number of availability zones to spread subnets over
    pub max_azs: u8,

    /// Prefix length of the public subnet
    pub subnet_mask: u8,

    pub subnet_name: String,

    pub subnet_type: SubnetType,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/16".to_string(),
            max_azs: 1,
            subnet_mask: 24,
            subnet_name: "Public".to_string(),
            subnet_type: SubnetType::Public,
        }
    }
}

impl NetworkSpec {
    /// Address range of the first subnet carved out of the VPC range
    ///
    /// The first subnet always starts at the VPC network address.
    pub fn first_subnet_cidr(&self) -> String {
        let network = self.cidr.split('/').next().unwrap_or(&self.cidr);
        format!("{}/{}", network, self.subnet_mask)
    }

    /// Address and prefix length of the VPC range, if it parses
    pub fn vpc_block(&self) -> Option<(Ipv4Addr, u8)> {
        let (address, prefix) = self.cidr.split_once('/')?;
        let address: Ipv4Addr = address.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;
        (prefix <= 32).then_some((address, prefix))
    }
}

/// Bits of an address below a `/prefix` boundary
pub fn host_bits(address: Ipv4Addr, prefix: u8) -> u32 {
    let mask = u32::MAX.checked_shr(u32::from(prefix)).unwrap_or(0);
    u32::from(address) & mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_subnet_cidr() {
        let network = NetworkSpec::default();
        assert_eq!(network.first_subnet_cidr(), "10.0.0.0/24");
    }

    #[test]
    fn test_first_subnet_cidr_custom() {
        let network = NetworkSpec {
            cidr: "172.16.0.0/20".to_string(),
            subnet_mask: 26,
            ..Default::default()
        };
        assert_eq!(network.first_subnet_cidr(), "172.16.0.0/26");
        assert_eq!(
            network.vpc_block(),
            Some((Ipv4Addr::new(172, 16, 0, 0), 20))
        );
    }

    #[test]
    fn test_vpc_block_rejects_malformed() {
        for cidr in ["10.0.0.0", "not-an-ip/16", "10.0.0.0/33", "10.0.0/16", "10.0.0.0/x"] {
            let network = NetworkSpec {
                cidr: cidr.to_string(),
                ..Default::default()
            };
            assert_eq!(network.vpc_block(), None, "{cidr}");
        }
    }

    #[test]
    fn test_host_bits() {
        assert_eq!(host_bits(Ipv4Addr::new(10, 0, 0, 0), 16), 0);
        assert_eq!(host_bits(Ipv4Addr::new(10, 0, 0, 5), 8), 5);
        assert_eq!(host_bits(Ipv4Addr::new(10, 1, 0, 0), 16), 0);
        assert_eq!(host_bits(Ipv4Addr::new(10, 1, 0, 0), 8), 1 << 16);
        assert_eq!(host_bits(Ipv4Addr::new(10, 0, 0, 1), 0), u32::from(Ipv4Addr::new(10, 0, 0, 1)));
        assert_eq!(host_bits(Ipv4Addr::new(10, 0, 0, 1), 32), 0);
    }
}
