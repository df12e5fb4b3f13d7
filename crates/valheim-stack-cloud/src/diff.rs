//! Template diff
//!
//! Classifies every difference between two templates into the action the
//! provisioning engine will take. Property changes listed in
//! [`requires_replacement`] mean a new physical resource. A replaced
//! resource gets a new physical ID and new attributes, so everything that
//! references it through `Ref`, `Fn::GetAtt` or `Fn::Sub` changes as well.

use crate::action::{Action, ActionType, ChangeScope, Plan};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use valheim_stack_core::cfn::intrinsic;
use valheim_stack_core::{Resource, Template};

/// Whether changing `property` on `resource_type` replaces the resource
pub fn requires_replacement(resource_type: &str, property: &str) -> bool {
    let replacing: &[&str] = match resource_type {
        "AWS::EC2::Instance" => &[
            "AvailabilityZone",
            "ImageId",
            "InstanceType",
            "KeyName",
            "SubnetId",
        ],
        "AWS::EC2::VPC" => &["CidrBlock", "InstanceTenancy"],
        "AWS::EC2::Subnet" => &["AvailabilityZone", "CidrBlock", "VpcId"],
        "AWS::EC2::SecurityGroup" => &["GroupDescription", "GroupName", "VpcId"],
        "AWS::EC2::RouteTable" => &["VpcId"],
        "AWS::EC2::Route" => &["DestinationCidrBlock", "RouteTableId"],
        "AWS::EC2::SubnetRouteTableAssociation" => &["SubnetId"],
        "AWS::IAM::Role" => &["Path", "RoleName"],
        "AWS::IAM::InstanceProfile" => &["InstanceProfileName", "Path"],
        "AWS::Backup::BackupVault" => &["BackupVaultName", "EncryptionKeyArn"],
        "AWS::Backup::BackupSelection" => &["BackupPlanId", "BackupSelection"],
        _ => &[],
    };
    replacing.contains(&property)
}

/// Plan the changes from `previous` to `desired`
///
/// With no previous template every entry is a create.
pub fn diff(previous: Option<&Template>, desired: &Template) -> Plan {
    let empty = Template::default();
    let previous = previous.unwrap_or(&empty);

    let mut actions = Vec::new();
    diff_section(
        ChangeScope::Parameter,
        &to_values(&previous.parameters),
        &to_values(&desired.parameters),
        &BTreeSet::new(),
        &mut actions,
    );

    let mut resource_actions = Vec::new();
    diff_resources(&previous.resources, &desired.resources, &mut resource_actions);
    let replaced = propagate_replacements(&desired.resources, &mut resource_actions);
    actions.extend(resource_actions);

    diff_section(
        ChangeScope::Output,
        &to_values(&previous.outputs),
        &to_values(&desired.outputs),
        &replaced,
        &mut actions,
    );

    let plan = Plan::new(actions);
    info!(summary = %plan.summary(), "Computed plan");
    plan
}

fn to_values<T: serde::Serialize>(map: &BTreeMap<String, T>) -> BTreeMap<String, Value> {
    map.iter()
        .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
        .collect()
}

fn all_keys<'a, A, B>(a: &'a BTreeMap<String, A>, b: &'a BTreeMap<String, B>) -> BTreeSet<&'a String> {
    a.keys().chain(b.keys()).collect()
}

fn diff_resources(
    previous: &BTreeMap<String, Resource>,
    desired: &BTreeMap<String, Resource>,
    actions: &mut Vec<Action>,
) {
    for id in all_keys(previous, desired) {
        let action = match (previous.get(id), desired.get(id)) {
            (None, Some(new)) => resource_action(ActionType::Create, id, new, BTreeMap::new()),
            (Some(old), None) => resource_action(ActionType::Delete, id, old, BTreeMap::new()),
            (Some(old), Some(new)) => compare_resource(id, old, new),
            (None, None) => continue,
        };
        debug!(logical_id = %id, action = %action.action_type, "Planned resource");
        actions.push(action);
    }
}

fn compare_resource(id: &str, old: &Resource, new: &Resource) -> Action {
    if old.resource_type != new.resource_type {
        let details = BTreeMap::from([(
            "previous_type".to_string(),
            json!(old.resource_type),
        )]);
        return resource_action(ActionType::Replace, id, new, details);
    }

    let keys: BTreeSet<&String> = old
        .properties
        .keys()
        .chain(new.properties.keys())
        .collect();
    let changed: Vec<&String> = keys
        .into_iter()
        .filter(|key| old.properties.get(*key) != new.properties.get(*key))
        .collect();
    let forcing: Vec<&String> = changed
        .iter()
        .copied()
        .filter(|key| requires_replacement(&new.resource_type, key))
        .collect();
    let attributes_changed = old.depends_on != new.depends_on
        || old.deletion_policy != new.deletion_policy
        || old.update_replace_policy != new.update_replace_policy;

    let mut details = BTreeMap::new();
    if !changed.is_empty() {
        details.insert("changed_properties".to_string(), json!(changed));
    }
    if !forcing.is_empty() {
        details.insert("requires_replacement".to_string(), json!(forcing));
    }
    if attributes_changed {
        details.insert("changed_attributes".to_string(), json!(true));
    }

    let action_type = if !forcing.is_empty() {
        ActionType::Replace
    } else if !changed.is_empty() || attributes_changed {
        ActionType::Update
    } else {
        ActionType::NoOp
    };
    resource_action(action_type, id, new, details)
}

fn resource_action(
    action_type: ActionType,
    id: &str,
    resource: &Resource,
    details: BTreeMap<String, Value>,
) -> Action {
    let mut action = Action {
        id: String::new(),
        action_type,
        scope: ChangeScope::Resource,
        resource_type: resource.resource_type.clone(),
        resource_id: id.to_string(),
        description: String::new(),
        details,
    };
    relabel(&mut action, action_type);
    action
}

fn relabel(action: &mut Action, action_type: ActionType) {
    action.action_type = action_type;
    action.id = format!("{action_type}-{}", action.resource_id);
    action.description = format!(
        "{} {} ({})",
        action_type, action.resource_id, action.resource_type
    );
}

/// Logical IDs a value points at through intrinsic functions
fn collect_targets(value: &Value, targets: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("Ref") {
                targets.insert(id.clone());
            }
            if let Some(Value::Array(args)) = map.get("Fn::GetAtt")
                && let Some(Value::String(id)) = args.first()
            {
                targets.insert(id.clone());
            }
            match map.get("Fn::Sub") {
                Some(Value::String(template)) => sub_targets(template, targets),
                Some(Value::Array(args)) => {
                    if let Some(Value::String(template)) = args.first() {
                        sub_targets(template, targets);
                    }
                }
                _ => {}
            }
            map.values().for_each(|v| collect_targets(v, targets));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_targets(v, targets)),
        _ => {}
    }
}

fn sub_targets(template: &str, targets: &mut BTreeSet<String>) {
    targets.extend(intrinsic::sub_targets(template).into_iter().map(str::to_string));
}

fn references_any(value: &Value, ids: &BTreeSet<String>) -> bool {
    let mut targets = BTreeSet::new();
    collect_targets(value, &mut targets);
    !targets.is_disjoint(ids)
}

/// Carry replacements over to the resources that reference them
///
/// Repeats until no further resource is replaced. Returns every replaced
/// logical ID.
fn propagate_replacements(
    desired: &BTreeMap<String, Resource>,
    actions: &mut [Action],
) -> BTreeSet<String> {
    let mut replaced: BTreeSet<String> = actions
        .iter()
        .filter(|a| a.action_type == ActionType::Replace)
        .map(|a| a.resource_id.clone())
        .collect();

    loop {
        let mut grew = false;
        for action in actions.iter_mut() {
            if !matches!(action.action_type, ActionType::NoOp | ActionType::Update) {
                continue;
            }
            let Some(resource) = desired.get(&action.resource_id) else {
                continue;
            };
            let affected: Vec<&String> = resource
                .properties
                .iter()
                .filter(|(_, value)| references_any(value, &replaced))
                .map(|(name, _)| name)
                .collect();
            if affected.is_empty() {
                continue;
            }
            let forcing: Vec<&String> = affected
                .iter()
                .copied()
                .filter(|name| requires_replacement(&resource.resource_type, name))
                .collect();

            action
                .details
                .insert("replaced_references".to_string(), json!(affected));
            if !forcing.is_empty() {
                action
                    .details
                    .insert("requires_replacement".to_string(), json!(forcing));
                relabel(action, ActionType::Replace);
                replaced.insert(action.resource_id.clone());
                grew = true;
            } else if action.action_type == ActionType::NoOp {
                relabel(action, ActionType::Update);
            }
        }
        if !grew {
            break;
        }
    }

    debug!(replaced = replaced.len(), "Propagated replacements");
    replaced
}

fn diff_section(
    scope: ChangeScope,
    previous: &BTreeMap<String, Value>,
    desired: &BTreeMap<String, Value>,
    replaced: &BTreeSet<String>,
    actions: &mut Vec<Action>,
) {
    for name in all_keys(previous, desired) {
        let action_type = match (previous.get(name), desired.get(name)) {
            (None, Some(_)) => ActionType::Create,
            (Some(_), None) => ActionType::Delete,
            (Some(old), Some(new)) if old != new => ActionType::Update,
            (Some(_), Some(new)) if references_any(new, replaced) => ActionType::Update,
            (Some(_), Some(_)) => ActionType::NoOp,
            (None, None) => continue,
        };
        actions.push(Action {
            id: format!("{action_type}-{scope}-{name}"),
            action_type,
            scope,
            resource_type: String::new(),
            resource_id: name.clone(),
            description: format!("{action_type} {scope} {name}"),
            details: BTreeMap::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valheim_stack_core::synth::{
        BACKUP_PLAN_ID, BACKUP_SELECTION_ID, BACKUP_VAULT_ID, INSTANCE_ID, SECURITY_GROUP_ID,
    };
    use valheim_stack_core::{Declaration, InstanceType, PortRange, synthesize};

    fn baseline() -> Template {
        synthesize(&Declaration::default())
    }

    #[test]
    fn test_first_synthesis_creates_everything() {
        let desired = baseline();
        let plan = diff(None, &desired);

        let summary = plan.summary();
        assert_eq!(summary.create, desired.resources.len());
        assert_eq!(summary.update + summary.replace + summary.delete, 0);
        assert!(plan.has_changes);
    }

    #[test]
    fn test_identical_templates_are_no_op() {
        let template = baseline();
        let plan = diff(Some(&template), &template);

        assert!(!plan.has_changes);
        assert_eq!(plan.summary().no_change, template.resources.len());
    }

    #[test]
    fn test_instance_type_change_replaces_instance() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.instance.instance_type = InstanceType::of("t3a", "large");
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);
        let action = plan.resource_action(INSTANCE_ID).unwrap();

        assert_eq!(action.action_type, ActionType::Replace);
        assert_eq!(
            action.details["requires_replacement"],
            json!(["InstanceType"])
        );
        assert_eq!(plan.summary().replace, 2);
        assert_eq!(plan.summary().update, 0);
    }

    #[test]
    fn test_instance_replacement_reaches_dependents() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.instance.instance_type = InstanceType::of("t3a", "large");
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);

        // the selection ARN is built from the instance ID
        let selection = plan.resource_action(BACKUP_SELECTION_ID).unwrap();
        assert_eq!(selection.action_type, ActionType::Replace);
        assert_eq!(
            selection.details["requires_replacement"],
            json!(["BackupSelection"])
        );
        assert_eq!(
            plan.resource_action(BACKUP_PLAN_ID).unwrap().action_type,
            ActionType::NoOp
        );

        let outputs: BTreeMap<&str, ActionType> = plan
            .actions
            .iter()
            .filter(|a| a.scope == ChangeScope::Output)
            .map(|a| (a.resource_id.as_str(), a.action_type))
            .collect();
        assert_eq!(outputs["InstanceId"], ActionType::Update);
        assert_eq!(outputs["PublicIP"], ActionType::Update);
        assert_eq!(outputs["ServerConnection"], ActionType::Update);
        assert_eq!(outputs["BackupVaultName"], ActionType::NoOp);
    }

    #[test]
    fn test_replacement_updates_in_place_when_reference_is_mutable() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.backup.vault_name = "renamed-vault".to_string();
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);

        // TargetBackupVault can change without a new plan
        let backup_plan = plan.resource_action(BACKUP_PLAN_ID).unwrap();
        assert_eq!(backup_plan.action_type, ActionType::Update);
        assert_eq!(
            backup_plan.details["replaced_references"],
            json!(["BackupPlan"])
        );
        // the selection points at the plan, which keeps its ID
        assert_eq!(
            plan.resource_action(BACKUP_SELECTION_ID).unwrap().action_type,
            ActionType::NoOp
        );
    }

    #[test]
    fn test_replacement_follows_sub_references() {
        let mut previous = Template::default();
        previous.resources.insert(
            "Server".to_string(),
            Resource::new("AWS::EC2::Instance", json!({ "InstanceType": "t3a.medium" })),
        );
        previous.resources.insert(
            "Association".to_string(),
            Resource::new(
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({ "SubnetId": intrinsic::sub("${Server.SubnetId}") }),
            ),
        );
        let mut desired = previous.clone();
        if let Some(server) = desired.resources.get_mut("Server") {
            server
                .properties
                .insert("InstanceType".to_string(), json!("t3a.large"));
        }

        let plan = diff(Some(&previous), &desired);
        assert_eq!(
            plan.resource_action("Association").unwrap().action_type,
            ActionType::Replace
        );
        assert_eq!(plan.summary().replace, 2);
    }

    #[test]
    fn test_port_change_updates_security_group_in_place() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.ingress.ports = PortRange::new(2456, 2460);
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);

        let group = plan.resource_action(SECURITY_GROUP_ID).unwrap();
        assert_eq!(group.action_type, ActionType::Update);
        assert_eq!(
            group.details["changed_properties"],
            json!(["SecurityGroupIngress"])
        );
        // the docker port mapping lives in the user data
        let instance = plan.resource_action(INSTANCE_ID).unwrap();
        assert_eq!(instance.action_type, ActionType::Update);
    }

    #[test]
    fn test_vault_rename_replaces_vault() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.backup.vault_name = "renamed-vault".to_string();
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);
        assert_eq!(
            plan.resource_action(BACKUP_VAULT_ID).unwrap().action_type,
            ActionType::Replace
        );
    }

    #[test]
    fn test_removed_resource_is_deleted() {
        let previous = baseline();
        let mut desired = previous.clone();
        desired.resources.remove(BACKUP_VAULT_ID);

        let plan = diff(Some(&previous), &desired);
        let action = plan.resource_action(BACKUP_VAULT_ID).unwrap();
        assert_eq!(action.action_type, ActionType::Delete);
        assert_eq!(action.resource_type, "AWS::Backup::BackupVault");
    }

    #[test]
    fn test_type_change_replaces() {
        let previous = baseline();
        let mut desired = previous.clone();
        if let Some(vault) = desired.resources.get_mut(BACKUP_VAULT_ID) {
            vault.resource_type = "AWS::S3::Bucket".to_string();
        }

        let plan = diff(Some(&previous), &desired);
        let action = plan.resource_action(BACKUP_VAULT_ID).unwrap();
        assert_eq!(action.action_type, ActionType::Replace);
        assert_eq!(
            action.details["previous_type"],
            json!("AWS::Backup::BackupVault")
        );
    }

    #[test]
    fn test_output_changes_are_reported() {
        let previous = baseline();
        let mut decl = Declaration::default();
        decl.ingress.ports = PortRange::new(3000, 3002);
        let desired = synthesize(&decl);

        let plan = diff(Some(&previous), &desired);
        let output = plan
            .actions
            .iter()
            .find(|a| a.scope == ChangeScope::Output && a.resource_id == "ServerConnection")
            .unwrap();
        assert_eq!(output.action_type, ActionType::Update);
    }

    #[test]
    fn test_actions_are_ordered() {
        let plan = diff(None, &baseline());
        let resource_ids: Vec<&str> = plan
            .actions
            .iter()
            .filter(|a| a.scope == ChangeScope::Resource)
            .map(|a| a.resource_id.as_str())
            .collect();
        let mut sorted = resource_ids.clone();
        sorted.sort();
        assert_eq!(resource_ids, sorted);
    }

    #[test]
    fn test_replacement_table() {
        assert!(requires_replacement("AWS::EC2::Instance", "InstanceType"));
        assert!(requires_replacement("AWS::EC2::Instance", "ImageId"));
        assert!(!requires_replacement("AWS::EC2::Instance", "UserData"));
        assert!(!requires_replacement("AWS::EC2::SecurityGroup", "SecurityGroupIngress"));
        assert!(!requires_replacement("AWS::Unknown::Thing", "Anything"));
    }
}
