//! Planned changes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Represents a planned change to one template entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action (`replace-ValheimInstance`)
    pub id: String,

    pub action_type: ActionType,

    /// Resource, parameter or output
    pub scope: ChangeScope,

    /// CloudFormation type for resources, empty otherwise
    pub resource_type: String,

    /// Logical ID or output/parameter name
    pub resource_id: String,

    pub description: String,

    /// Changed property names, and which of them force replacement
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update in place
    Update,
    /// Create a new physical resource and delete the old one
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl ActionType {
    /// Diff marker shown next to the entry
    pub fn symbol(&self) -> &'static str {
        match self {
            ActionType::Create => "+",
            ActionType::Update => "~",
            ActionType::Replace => "-/+",
            ActionType::Delete => "-",
            ActionType::NoOp => " ",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Template section an action belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeScope {
    Parameter,
    Resource,
    Output,
}

impl std::fmt::Display for ChangeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeScope::Parameter => write!(f, "parameter"),
            ChangeScope::Resource => write!(f, "resource"),
            ChangeScope::Output => write!(f, "output"),
        }
    }
}

/// Plan containing all actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Action for a logical ID in the resource section
    pub fn resource_action(&self, logical_id: &str) -> Option<&Action> {
        self.actions
            .iter()
            .find(|a| a.scope == ChangeScope::Resource && a.resource_id == logical_id)
    }

    /// Summary of resource actions
    pub fn summary(&self) -> PlanSummary {
        let count = |t: ActionType| {
            self.actions
                .iter()
                .filter(|a| a.scope == ChangeScope::Resource && a.action_type == t)
                .count()
        };
        PlanSummary {
            create: count(ActionType::Create),
            update: count(ActionType::Update),
            replace: count(ActionType::Replace),
            delete: count(ActionType::Delete),
            no_change: count(ActionType::NoOp),
        }
    }
}

/// Summary of planned resource actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}
