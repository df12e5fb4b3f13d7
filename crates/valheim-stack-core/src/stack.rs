//! Typed stack builder
//!
//! `Stack` collects resources as they are declared. Every `add_*` method
//! returns a typed reference, and resources that depend on another take
//! that reference as an argument, so the dependency chain is checked by the
//! compiler instead of relying on declaration order.

use crate::cfn::intrinsic;
use crate::cfn::{Output, Parameter, Resource, Template};
use crate::model::{
    BackupRule, IngressRule, InstanceIdentity, InstanceType, NetworkSpec, SecretRef,
    PARAMETER_READ_ACTIONS,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::debug;

const POLICY_VERSION: &str = "2012-10-17";

macro_rules! logical_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn logical_id(&self) -> &str {
                &self.0
            }

            /// `Ref` to the resource
            pub fn reference(&self) -> Value {
                intrinsic::reference(&self.0)
            }

            pub fn get_att(&self, attribute: &str) -> Value {
                intrinsic::get_att(&self.0, attribute)
            }
        }
    };
}

logical_ref!(
    /// SSM-backed image ID parameter
    ImageParameterRef
);
logical_ref!(RoleRef);
logical_ref!(PolicyRef);
logical_ref!(InstanceProfileRef);
logical_ref!(SecurityGroupRef);
logical_ref!(SubnetRef);
logical_ref!(InstanceRef);
logical_ref!(BackupVaultRef);
logical_ref!(BackupPlanRef);
logical_ref!(BackupSelectionRef);

/// VPC together with its internet gateway attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcRef {
    id: String,
    gateway_attachment: String,
}

impl VpcRef {
    pub fn logical_id(&self) -> &str {
        &self.id
    }

    pub fn reference(&self) -> Value {
        intrinsic::reference(&self.id)
    }

    pub fn gateway_attachment_id(&self) -> &str {
        &self.gateway_attachment
    }
}

/// Everything the instance is wired to
pub struct InstanceProps<'a> {
    pub subnet: &'a SubnetRef,
    pub security_group: &'a SecurityGroupRef,
    pub profile: &'a InstanceProfileRef,
    pub role: &'a RoleRef,
    pub grants: &'a [PolicyRef],
    pub image: &'a ImageParameterRef,
    pub instance_type: &'a InstanceType,
    pub user_data: Value,
}

/// Mutable collection of declared resources
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    description: Option<String>,
    parameters: BTreeMap<String, Parameter>,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, logical_id: &str, resource: Resource) {
        debug!(logical_id, resource_type = %resource.resource_type, "Declared resource");
        self.resources.insert(logical_id.to_string(), resource);
    }

    /// `Name` tag value in the `<stack>/<construct>` form
    fn name_tag(&self, construct: &str) -> Value {
        json!([{ "Key": "Name", "Value": format!("{}/{}", self.name, construct) }])
    }

    /// Deploy-time image lookup through a public SSM parameter
    pub fn add_image_parameter(&mut self, logical_id: &str, ssm_path: &str) -> ImageParameterRef {
        self.parameters.insert(
            logical_id.to_string(),
            Parameter {
                parameter_type: "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>".to_string(),
                default: Some(ssm_path.to_string()),
                description: None,
            },
        );
        ImageParameterRef(logical_id.to_string())
    }

    /// VPC with an internet gateway attached
    pub fn add_vpc(&mut self, logical_id: &str, network: &NetworkSpec) -> VpcRef {
        let vpc = Resource::new(
            "AWS::EC2::VPC",
            json!({
                "CidrBlock": network.cidr,
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
                "InstanceTenancy": "default",
                "Tags": self.name_tag(logical_id),
            }),
        );
        self.insert(logical_id, vpc);

        let igw_id = format!("{logical_id}IGW");
        let igw = Resource::new(
            "AWS::EC2::InternetGateway",
            json!({ "Tags": self.name_tag(logical_id) }),
        );
        self.insert(&igw_id, igw);

        let attachment_id = format!("{logical_id}VPCGW");
        let attachment = Resource::new(
            "AWS::EC2::VPCGatewayAttachment",
            json!({
                "InternetGatewayId": intrinsic::reference(&igw_id),
                "VpcId": intrinsic::reference(logical_id),
            }),
        );
        self.insert(&attachment_id, attachment);

        VpcRef {
            id: logical_id.to_string(),
            gateway_attachment: attachment_id,
        }
    }

    /// Public subnet routed to the internet gateway
    ///
    /// `index` is zero-based and selects the availability zone.
    pub fn add_public_subnet(
        &mut self,
        vpc: &VpcRef,
        network: &NetworkSpec,
        index: usize,
    ) -> SubnetRef {
        let construct = format!("{}{}Subnet{}", vpc.id, network.subnet_name, index + 1);
        let tag_path = format!("{}/{}Subnet{}", vpc.id, network.subnet_name, index + 1);

        let subnet = Resource::new(
            "AWS::EC2::Subnet",
            json!({
                "AvailabilityZone": intrinsic::select(index, intrinsic::get_azs()),
                "CidrBlock": network.first_subnet_cidr(),
                "MapPublicIpOnLaunch": true,
                "Tags": [
                    { "Key": "aws-cdk:subnet-name", "Value": network.subnet_name },
                    { "Key": "aws-cdk:subnet-type", "Value": network.subnet_type.as_str() },
                    { "Key": "Name", "Value": format!("{}/{}", self.name, tag_path) },
                ],
                "VpcId": vpc.reference(),
            }),
        );
        let subnet_id = format!("{construct}Subnet");
        self.insert(&subnet_id, subnet);

        let route_table_id = format!("{construct}RouteTable");
        let route_table = Resource::new(
            "AWS::EC2::RouteTable",
            json!({
                "Tags": self.name_tag(&tag_path),
                "VpcId": vpc.reference(),
            }),
        );
        self.insert(&route_table_id, route_table);

        let association = Resource::new(
            "AWS::EC2::SubnetRouteTableAssociation",
            json!({
                "RouteTableId": intrinsic::reference(&route_table_id),
                "SubnetId": intrinsic::reference(&subnet_id),
            }),
        );
        self.insert(&format!("{construct}RouteTableAssociation"), association);

        let default_route = Resource::new(
            "AWS::EC2::Route",
            json!({
                "DestinationCidrBlock": "0.0.0.0/0",
                "GatewayId": intrinsic::reference(&format!("{}IGW", vpc.id)),
                "RouteTableId": intrinsic::reference(&route_table_id),
            }),
        )
        .depends_on(vpc.gateway_attachment_id());
        self.insert(&format!("{construct}DefaultRoute"), default_route);

        SubnetRef(subnet_id)
    }

    /// Security group with one ingress rule and unrestricted egress
    pub fn add_security_group(
        &mut self,
        logical_id: &str,
        vpc: &VpcRef,
        description: &str,
        ingress: &IngressRule,
    ) -> SecurityGroupRef {
        let group = Resource::new(
            "AWS::EC2::SecurityGroup",
            json!({
                "GroupDescription": description,
                "SecurityGroupEgress": [{
                    "CidrIp": "0.0.0.0/0",
                    "Description": "Allow all outbound traffic by default",
                    "IpProtocol": "-1",
                }],
                "SecurityGroupIngress": [{
                    "CidrIp": ingress.peer,
                    "Description": ingress.description,
                    "FromPort": ingress.ports.low,
                    "IpProtocol": ingress.protocol.as_str(),
                    "ToPort": ingress.ports.high,
                }],
                "VpcId": vpc.reference(),
            }),
        );
        self.insert(logical_id, group);
        SecurityGroupRef(logical_id.to_string())
    }

    /// Role assumed by the instance, with its managed policies
    pub fn add_instance_role(&mut self, logical_id: &str, identity: &InstanceIdentity) -> RoleRef {
        let managed: Vec<Value> = identity
            .managed_policies
            .iter()
            .map(|p| intrinsic::managed_policy_arn(p))
            .collect();

        let role = Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": assume_role_document(&identity.assumed_by),
                "ManagedPolicyArns": managed,
            }),
        );
        self.insert(logical_id, role);
        RoleRef(logical_id.to_string())
    }

    /// Grant the role read access to exactly one SecureString parameter
    pub fn grant_parameter_read(&mut self, role: &RoleRef, secret: &SecretRef) -> PolicyRef {
        let policy_id = format!("{}DefaultPolicy", role.0);
        let parameter_arn =
            intrinsic::regional_arn("ssm", vec![json!(secret.arn_resource())]);

        let policy = Resource::new(
            "AWS::IAM::Policy",
            json!({
                "PolicyDocument": {
                    "Statement": [{
                        "Action": PARAMETER_READ_ACTIONS,
                        "Effect": "Allow",
                        "Resource": parameter_arn,
                    }],
                    "Version": POLICY_VERSION,
                },
                "PolicyName": policy_id,
                "Roles": [role.reference()],
            }),
        );
        self.insert(&policy_id, policy);
        PolicyRef(policy_id)
    }

    pub fn add_instance_profile(&mut self, logical_id: &str, role: &RoleRef) -> InstanceProfileRef {
        let profile = Resource::new(
            "AWS::IAM::InstanceProfile",
            json!({ "Roles": [role.reference()] }),
        );
        self.insert(logical_id, profile);
        InstanceProfileRef(logical_id.to_string())
    }

    /// The compute instance
    ///
    /// It waits for the role and its grants so the bootstrap script can read
    /// the secret on first boot.
    pub fn add_instance(&mut self, logical_id: &str, props: InstanceProps<'_>) -> InstanceRef {
        let mut instance = Resource::new(
            "AWS::EC2::Instance",
            json!({
                "AvailabilityZone": intrinsic::select(0, intrinsic::get_azs()),
                "IamInstanceProfile": props.profile.reference(),
                "ImageId": props.image.reference(),
                "InstanceType": props.instance_type.to_string(),
                "SecurityGroupIds": [props.security_group.get_att("GroupId")],
                "SubnetId": props.subnet.reference(),
                "Tags": self.name_tag(logical_id),
                "UserData": props.user_data,
            }),
        )
        .depends_on(props.role.logical_id());
        for grant in props.grants {
            instance = instance.depends_on(grant.logical_id());
        }
        self.insert(logical_id, instance);
        InstanceRef(logical_id.to_string())
    }

    /// Vault kept when the stack is torn down
    pub fn add_backup_vault(&mut self, logical_id: &str, vault_name: &str) -> BackupVaultRef {
        let vault = Resource::new(
            "AWS::Backup::BackupVault",
            json!({ "BackupVaultName": vault_name }),
        )
        .retain();
        self.insert(logical_id, vault);
        BackupVaultRef(logical_id.to_string())
    }

    pub fn add_backup_plan(
        &mut self,
        logical_id: &str,
        vault: &BackupVaultRef,
        plan_name: &str,
        rule: &BackupRule,
    ) -> BackupPlanRef {
        let plan = Resource::new(
            "AWS::Backup::BackupPlan",
            json!({
                "BackupPlan": {
                    "BackupPlanName": plan_name,
                    "BackupPlanRule": [{
                        "CompletionWindowMinutes": rule.completion_window_minutes,
                        "Lifecycle": { "DeleteAfterDays": rule.delete_after_days },
                        "RuleName": rule.name,
                        "ScheduleExpression": rule.schedule.expression(),
                        "StartWindowMinutes": rule.start_window_minutes,
                        "TargetBackupVault": vault.get_att("BackupVaultName"),
                    }],
                },
            }),
        );
        self.insert(logical_id, plan);
        BackupPlanRef(logical_id.to_string())
    }

    /// Bind the instance to the plan through a backup service role
    pub fn add_backup_selection(
        &mut self,
        logical_id: &str,
        plan: &BackupPlanRef,
        instance: &InstanceRef,
        selection_name: &str,
    ) -> BackupSelectionRef {
        let role_id = format!("{logical_id}Role");
        let role = Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": assume_role_document("backup.amazonaws.com"),
                "ManagedPolicyArns": [intrinsic::managed_policy_arn(
                    "service-role/AWSBackupServiceRolePolicyForBackup"
                )],
            }),
        );
        self.insert(&role_id, role);

        let instance_arn = intrinsic::regional_arn(
            "ec2",
            vec![json!("instance/"), instance.reference()],
        );
        let selection = Resource::new(
            "AWS::Backup::BackupSelection",
            json!({
                "BackupPlanId": plan.get_att("BackupPlanId"),
                "BackupSelection": {
                    "IamRoleArn": intrinsic::get_att(&role_id, "Arn"),
                    "Resources": [instance_arn],
                    "SelectionName": selection_name,
                },
            }),
        );
        self.insert(logical_id, selection);
        BackupSelectionRef(logical_id.to_string())
    }

    pub fn add_output(&mut self, name: &str, value: Value, description: &str) {
        self.outputs.insert(
            name.to_string(),
            Output {
                value,
                description: Some(description.to_string()),
            },
        );
    }

    /// Finish the stack into a template document
    pub fn build(self) -> Template {
        Template {
            description: self.description,
            parameters: self.parameters,
            resources: self.resources,
            outputs: self.outputs,
        }
    }
}

fn assume_role_document(service: &str) -> Value {
    json!({
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "Service": service },
        }],
        "Version": POLICY_VERSION,
    })
}
