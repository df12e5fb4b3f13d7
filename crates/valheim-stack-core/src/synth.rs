//! Declaration synthesis
//!
//! Turns a [`Declaration`] into the template document consumed by the
//! provisioning engine. The resource graph is fixed: network, access rule,
//! identity, instance, backup. Nothing here can fail.

use crate::cfn::Template;
use crate::cfn::intrinsic::{self, Pseudo};
use crate::model::{Declaration, Fragment};
use crate::stack::{InstanceProps, Stack};
use serde_json::{Value, json};
use tracing::info;

pub const VPC_ID: &str = "ValheimVPC";
pub const SECURITY_GROUP_ID: &str = "ValheimSecurityGroup";
pub const ROLE_ID: &str = "ValheimInstanceRole";
pub const INSTANCE_PROFILE_ID: &str = "ValheimInstanceInstanceProfile";
pub const INSTANCE_ID: &str = "ValheimInstance";
pub const IMAGE_PARAMETER_ID: &str = "SsmParameterValueAmazonLinux2ImageId";
pub const BACKUP_VAULT_ID: &str = "ValheimBackupVault";
pub const BACKUP_PLAN_ID: &str = "ValheimBackupPlan";
pub const BACKUP_SELECTION_ID: &str = "ValheimBackupSelection";

/// Build the complete resource graph for a declaration
pub fn synthesize(decl: &Declaration) -> Template {
    let mut stack = Stack::new(&decl.stack_name).with_description(decl.description.clone());

    // Network
    let vpc = stack.add_vpc(VPC_ID, &decl.network);
    let subnet = stack.add_public_subnet(&vpc, &decl.network, 0);
    let security_group = stack.add_security_group(
        SECURITY_GROUP_ID,
        &vpc,
        "Security group for Valheim dedicated server",
        &decl.ingress,
    );

    // Identity and secret access
    let role = stack.add_instance_role(ROLE_ID, &decl.identity);
    let grant = stack.grant_parameter_read(&role, &decl.secret);
    let profile = stack.add_instance_profile(INSTANCE_PROFILE_ID, &role);

    // Compute
    let image = stack.add_image_parameter(IMAGE_PARAMETER_ID, &decl.instance.image.parameter_name);
    let instance = stack.add_instance(
        INSTANCE_ID,
        InstanceProps {
            subnet: &subnet,
            security_group: &security_group,
            profile: &profile,
            role: &role,
            grants: std::slice::from_ref(&grant),
            image: &image,
            instance_type: &decl.instance.instance_type,
            user_data: user_data(decl),
        },
    );

    // Backup
    let vault = stack.add_backup_vault(BACKUP_VAULT_ID, &decl.backup.vault_name);
    let plan = stack.add_backup_plan(
        BACKUP_PLAN_ID,
        &vault,
        &decl.backup.plan_name,
        &decl.backup.rule,
    );
    stack.add_backup_selection(
        BACKUP_SELECTION_ID,
        &plan,
        &instance,
        &decl.backup.selection_name,
    );

    // Outputs
    let public_ip = instance.get_att("PublicIp");
    stack.add_output("InstanceId", instance.reference(), "EC2 Instance ID");
    stack.add_output("PublicIP", public_ip.clone(), "Public IP address");
    stack.add_output(
        "ServerConnection",
        intrinsic::join(
            "",
            vec![
                public_ip,
                json!(format!(":{}", decl.ingress.ports.primary())),
            ],
        ),
        "Valheim server connection address",
    );
    stack.add_output(
        "BackupVaultName",
        vault.get_att("BackupVaultName"),
        "AWS Backup Vault name for Valheim server",
    );

    let template = stack.build();
    info!(
        stack = %decl.stack_name,
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "Synthesized template"
    );
    template
}

/// Base64 user data with the region left as a deploy-time reference
fn user_data(decl: &Declaration) -> Value {
    let parts: Vec<Value> = decl
        .bootstrap_script()
        .fragments()
        .into_iter()
        .map(|fragment| match fragment {
            Fragment::Literal(s) => Value::String(s),
            Fragment::Region => Pseudo::Region.reference(),
        })
        .collect();
    intrinsic::base64(intrinsic::join("", parts))
}
