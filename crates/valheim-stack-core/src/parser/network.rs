//! network and ports nodes

use super::{args, children, int_arg, int_value, string_arg, unknown};
use crate::error::{Result, StackError};
use crate::model::{NetworkSpec, PortRange};
use kdl::KdlNode;

pub(super) fn parse_network(node: &KdlNode, network: &mut NetworkSpec) -> Result<()> {
    for child in children(node) {
        match child.name().value() {
            "cidr" => network.cidr = string_arg(child)?,
            "subnet-mask" | "subnet_mask" => network.subnet_mask = int_arg(child)?,
            "subnet-name" | "subnet_name" => network.subnet_name = string_arg(child)?,
            other => return Err(unknown("network", other)),
        }
    }
    Ok(())
}

/// `ports 2456 2458` or `ports 2456`
pub(super) fn parse_ports(node: &KdlNode) -> Result<PortRange> {
    let values: Vec<_> = args(node).collect();
    match values.as_slice() {
        [single] => {
            let port = int_value(Some(*single), "ports")?;
            Ok(PortRange::new(port, port))
        }
        [low, high] => Ok(PortRange::new(
            int_value(Some(*low), "ports")?,
            int_value(Some(*high), "ports")?,
        )),
        _ => Err(StackError::InvalidConfig(
            "ports takes a port or a low/high pair".to_string(),
        )),
    }
}
