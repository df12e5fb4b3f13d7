//! Backup vault, plan and selection

use serde::{Deserialize, Serialize};

/// Daily cron schedule (minute and hour, every day, UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    pub minute: u8,
    pub hour: u8,
}

impl CronSchedule {
    pub fn daily_at(hour: u8, minute: u8) -> Self {
        Self { minute, hour }
    }

    /// AWS schedule expression
    ///
    /// Day-of-week must be `?` when day-of-month is `*`.
    pub fn expression(&self) -> String {
        format!("cron({} {} * * ? *)", self.minute, self.hour)
    }
}

impl Default for CronSchedule {
    fn default() -> Self {
        Self::daily_at(4, 0)
    }
}

/// Backup plan rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRule {
    pub name: String,
    pub schedule: CronSchedule,
    pub delete_after_days: u32,
    pub start_window_minutes: u32,
    pub completion_window_minutes: u32,
}

impl Default for BackupRule {
    fn default() -> Self {
        Self {
            name: "DailyBackups".to_string(),
            schedule: CronSchedule::default(),
            delete_after_days: 7,
            start_window_minutes: 60,
            completion_window_minutes: 120,
        }
    }
}

/// Vault, plan and selection binding the instance to the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSpec {
    pub vault_name: String,
    pub plan_name: String,
    pub selection_name: String,
    pub rule: BackupRule,
}

impl Default for BackupSpec {
    fn default() -> Self {
        Self {
            vault_name: "valheim-server-backup-vault".to_string(),
            plan_name: "valheim-server-backup-plan".to_string(),
            selection_name: "valheim-server-selection".to_string(),
            rule: BackupRule::default(),
        }
    }
}
