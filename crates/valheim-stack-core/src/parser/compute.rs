//! instance and server nodes

use super::{bool_arg, children, string_arg, unknown};
use crate::error::{Result, StackError};
use crate::model::{GameServer, InstanceSpec, InstanceType};
use kdl::KdlNode;

pub(super) fn parse_instance(node: &KdlNode, instance: &mut InstanceSpec) -> Result<()> {
    for child in children(node) {
        match child.name().value() {
            "type" => {
                let raw = string_arg(child)?;
                instance.instance_type = InstanceType::parse(&raw).ok_or_else(|| {
                    StackError::InvalidConfig(format!(
                        "instance type '{raw}' must look like class.size"
                    ))
                })?;
            }
            "image-parameter" | "image_parameter" => {
                instance.image.parameter_name = string_arg(child)?
            }
            other => return Err(unknown("instance", other)),
        }
    }
    Ok(())
}

pub(super) fn parse_server(node: &KdlNode, server: &mut GameServer) -> Result<()> {
    for child in children(node) {
        match child.name().value() {
            "name" => server.name = string_arg(child)?,
            "world" => server.world = string_arg(child)?,
            "public" => server.public = bool_arg(child)?,
            "crossplay" => server.crossplay = bool_arg(child)?,
            "image" => server.image = string_arg(child)?,
            "container" => server.container_name = string_arg(child)?,
            "config-dir" | "config_dir" => server.config_dir = string_arg(child)?,
            "data-dir" | "data_dir" => server.data_dir = string_arg(child)?,
            other => return Err(unknown("server", other)),
        }
    }
    Ok(())
}
