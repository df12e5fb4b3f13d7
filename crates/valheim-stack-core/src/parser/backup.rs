//! backup node

use super::{children, int_arg, int_value, property, string_arg, unknown};
use crate::error::Result;
use crate::model::BackupSpec;
use kdl::KdlNode;

pub(super) fn parse_backup(node: &KdlNode, backup: &mut BackupSpec) -> Result<()> {
    for child in children(node) {
        match child.name().value() {
            "vault" => backup.vault_name = string_arg(child)?,
            "plan" => backup.plan_name = string_arg(child)?,
            "selection" => backup.selection_name = string_arg(child)?,
            "rule" => backup.rule.name = string_arg(child)?,
            "schedule" => {
                // schedule minute=0 hour=4
                if let Some(minute) = property(child, "minute") {
                    backup.rule.schedule.minute = int_value(Some(minute), "schedule minute")?;
                }
                if let Some(hour) = property(child, "hour") {
                    backup.rule.schedule.hour = int_value(Some(hour), "schedule hour")?;
                }
            }
            "retain-days" | "retain_days" => backup.rule.delete_after_days = int_arg(child)?,
            "start-window-minutes" | "start_window_minutes" => {
                backup.rule.start_window_minutes = int_arg(child)?
            }
            "completion-window-minutes" | "completion_window_minutes" => {
                backup.rule.completion_window_minutes = int_arg(child)?
            }
            other => return Err(unknown("backup", other)),
        }
    }
    Ok(())
}
