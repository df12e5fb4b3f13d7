//! KDL declaration parser
//!
//! Every node is optional; anything left out keeps the stock value.
//! Node parsers live in submodules per section.

mod backup;
mod compute;
mod network;

use crate::error::{Result, StackError};
use crate::model::{Declaration, SecretRef};
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse a declaration file (no template expansion)
pub fn parse_kdl_file<P: AsRef<Path>>(path: P) -> Result<Declaration> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_kdl_string(&content)
}

/// Parse a declaration document
pub fn parse_kdl_string(content: &str) -> Result<Declaration> {
    let doc: KdlDocument = content.parse()?;
    let mut decl = Declaration::default();

    for node in doc.nodes() {
        debug!(node = node.name().value(), "Parsing declaration node");
        match node.name().value() {
            "stack" => {
                decl.stack_name = string_arg(node)?;
                for child in children(node) {
                    match child.name().value() {
                        "description" => decl.description = Some(string_arg(child)?),
                        other => return Err(unknown("stack", other)),
                    }
                }
            }
            "network" => network::parse_network(node, &mut decl.network)?,
            "ports" => decl.ingress.ports = network::parse_ports(node)?,
            "secret" => decl.secret = SecretRef::new(string_arg(node)?),
            "instance" => compute::parse_instance(node, &mut decl.instance)?,
            "server" => compute::parse_server(node, &mut decl.server)?,
            "backup" => backup::parse_backup(node, &mut decl.backup)?,
            other => return Err(unknown("declaration", other)),
        }
    }

    Ok(decl)
}

fn unknown(section: &str, name: &str) -> StackError {
    StackError::InvalidConfig(format!("unknown node '{name}' in {section}"))
}

/// Child nodes of a block (empty when the node has no block)
fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn first_arg(node: &KdlNode) -> Option<&KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .map(|e| e.value())
}

/// Positional arguments in order
fn args(node: &KdlNode) -> impl Iterator<Item = &KdlValue> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .map(|e| e.value())
}

fn property<'a>(node: &'a KdlNode, key: &str) -> Option<&'a KdlValue> {
    node.entries()
        .iter()
        .find(|e| e.name().map(|n| n.value()) == Some(key))
        .map(|e| e.value())
}

fn string_arg(node: &KdlNode) -> Result<String> {
    first_arg(node)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            StackError::InvalidConfig(format!("{} requires a string", node.name().value()))
        })
}

fn bool_arg(node: &KdlNode) -> Result<bool> {
    first_arg(node).and_then(|v| v.as_bool()).ok_or_else(|| {
        StackError::InvalidConfig(format!(
            "{} requires #true or #false",
            node.name().value()
        ))
    })
}

fn int_value<T: TryFrom<i128>>(value: Option<&KdlValue>, what: &str) -> Result<T> {
    let raw = value
        .and_then(|v| v.as_integer())
        .ok_or_else(|| StackError::InvalidConfig(format!("{what} requires an integer")))?;
    T::try_from(raw)
        .map_err(|_| StackError::InvalidConfig(format!("{what} value {raw} is out of range")))
}

fn int_arg<T: TryFrom<i128>>(node: &KdlNode) -> Result<T> {
    int_value(first_arg(node), node.name().value())
}
