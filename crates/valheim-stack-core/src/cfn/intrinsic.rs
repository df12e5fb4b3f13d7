//! Intrinsic functions and pseudo parameters

use serde_json::{Value, json};

/// Pseudo parameters filled in by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    AccountId,
    Partition,
    Region,
}

impl Pseudo {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AccountId => "AWS::AccountId",
            Self::Partition => "AWS::Partition",
            Self::Region => "AWS::Region",
        }
    }

    pub fn reference(&self) -> Value {
        reference(self.name())
    }
}

/// `{ "Ref": id }`
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [id, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Join": [delimiter, parts] }`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// `{ "Fn::Base64": value }`
pub fn base64(value: Value) -> Value {
    json!({ "Fn::Base64": value })
}

/// `{ "Fn::Select": [index, list] }`
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{ "Fn::Sub": template }`, `${Id}` and `${Id.Attribute}` resolved by the engine
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// Logical IDs named by `${...}` placeholders in a `Fn::Sub` string
///
/// `${!Literal}` escapes and pseudo parameters (`${AWS::Region}`) are skipped.
pub fn sub_targets(template: &str) -> Vec<&str> {
    let mut targets = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        rest = &rest[start + 2..];
        let Some(end) = rest.find('}') else {
            break;
        };
        let name = &rest[..end];
        rest = &rest[end + 1..];
        if name.starts_with('!') || name.contains("::") {
            continue;
        }
        let id = name.split_once('.').map_or(name, |(id, _)| id);
        if !id.is_empty() {
            targets.push(id);
        }
    }
    targets
}

/// Availability zones of the deploy region
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

/// ARN in the current partition: `arn:<partition>:<rest...>`
pub fn partition_arn(rest: Vec<Value>) -> Value {
    let mut parts = vec![json!("arn:"), Pseudo::Partition.reference()];
    parts.extend(rest);
    join("", parts)
}

/// ARN of an AWS managed policy
pub fn managed_policy_arn(policy_name: &str) -> Value {
    partition_arn(vec![json!(format!(":iam::aws:policy/{policy_name}"))])
}

/// ARN of a regional resource owned by the deploying account
pub fn regional_arn(service: &str, resource: Vec<Value>) -> Value {
    let mut rest = vec![
        json!(format!(":{service}:")),
        Pseudo::Region.reference(),
        json!(":"),
        Pseudo::AccountId.reference(),
        json!(":"),
    ];
    rest.extend(resource);
    partition_arn(rest)
}
