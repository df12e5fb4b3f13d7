//! Structural checks
//!
//! Synthesis never calls these. They mirror what the provisioning engine
//! would reject at apply time so mistakes surface before a deploy.

use crate::model::{Declaration, host_bits};
use regex::Regex;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

/// Minimum start window accepted by AWS Backup
const MIN_START_WINDOW_MINUTES: u32 = 60;

/// VPC prefix lengths accepted by EC2
const VPC_PREFIX_RANGE: std::ops::RangeInclusive<u8> = 16..=28;

fn instance_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").expect("instance type pattern is valid")
    })
}

/// Single finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Dotted path of the offending setting (`backup.rule.schedule`)
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors block a deploy, warnings do not
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(Finding {
            field,
            message: message.into(),
        });
    }

    fn warn(&mut self, field: &'static str, message: impl Into<String>) {
        self.warnings.push(Finding {
            field,
            message: message.into(),
        });
    }
}

pub fn validate(decl: &Declaration) -> ValidationReport {
    let mut report = ValidationReport::default();

    match decl.network.vpc_block() {
        None => report.error(
            "network.cidr",
            format!("'{}' is not an IPv4 CIDR block", decl.network.cidr),
        ),
        Some((address, prefix)) => {
            if !VPC_PREFIX_RANGE.contains(&prefix) {
                report.error(
                    "network.cidr",
                    format!("/{prefix} is outside the allowed /16 to /28 VPC range"),
                );
            }
            let host = host_bits(address, prefix);
            if host != 0 {
                let network = Ipv4Addr::from(u32::from(address) - host);
                report.error(
                    "network.cidr",
                    format!(
                        "'{}' has host bits set, use {network}/{prefix}",
                        decl.network.cidr
                    ),
                );
            }
            if prefix > decl.network.subnet_mask {
                report.error(
                    "network.subnet-mask",
                    format!(
                        "/{} subnet does not fit inside the /{} VPC range",
                        decl.network.subnet_mask, prefix
                    ),
                );
            }
        }
    }
    if decl.network.subnet_mask > 28 {
        report.error("network.subnet-mask", "subnet mask must be /28 or larger");
    }

    let ports = decl.ingress.ports;
    if ports.low == 0 {
        report.error("ports", "port 0 cannot be opened");
    }
    if ports.low > ports.high {
        report.error(
            "ports",
            format!("range {}-{} is reversed", ports.low, ports.high),
        );
    }
    if !decl.ingress.protocol.is_connectionless() {
        report.error(
            "ports",
            format!("game traffic is udp, not {}", decl.ingress.protocol),
        );
    }

    let instance_type = decl.instance.instance_type.to_string();
    if !instance_type_pattern().is_match(&instance_type) {
        report.error(
            "instance.type",
            format!("'{instance_type}' is not a valid instance type"),
        );
    }

    if !decl.secret.parameter_name.starts_with('/') {
        report.error(
            "secret",
            format!(
                "parameter name '{}' must be a path starting with '/'",
                decl.secret.parameter_name
            ),
        );
    }

    let rule = &decl.backup.rule;
    if rule.schedule.hour > 23 {
        report.error("backup.schedule", format!("hour {} is out of range", rule.schedule.hour));
    }
    if rule.schedule.minute > 59 {
        report.error(
            "backup.schedule",
            format!("minute {} is out of range", rule.schedule.minute),
        );
    }
    if rule.delete_after_days == 0 {
        report.error("backup.retain-days", "recovery points must be kept at least one day");
    }
    if rule.start_window_minutes < MIN_START_WINDOW_MINUTES {
        report.error(
            "backup.start-window-minutes",
            format!("start window must be at least {MIN_START_WINDOW_MINUTES} minutes"),
        );
    }
    if rule.completion_window_minutes <= rule.start_window_minutes {
        report.error(
            "backup.completion-window-minutes",
            "completion window must be longer than the start window",
        );
    }

    // World data lives on the root volume only.
    report.warn(
        "server.data-dir",
        format!(
            "{} is not on durable storage; world data is lost if the instance is replaced",
            decl.server.data_dir
        ),
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InstanceType, PortRange, Protocol, SecretRef};

    #[test]
    fn test_default_declaration_is_valid() {
        let report = validate(&Declaration::default());
        assert!(report.is_ok(), "{:?}", report.errors);
    }

    #[test]
    fn test_durability_gap_is_flagged() {
        let report = validate(&Declaration::default());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].field, "server.data-dir");
        assert!(report.warnings[0].message.contains("/opt/valheim/data"));
    }

    #[test]
    fn test_reversed_port_range() {
        let mut decl = Declaration::default();
        decl.ingress.ports = PortRange::new(2458, 2456);
        let report = validate(&decl);
        assert!(!report.is_ok());
        assert_eq!(report.errors[0].field, "ports");
    }

    #[test]
    fn test_tcp_rejected() {
        let mut decl = Declaration::default();
        decl.ingress.protocol = Protocol::Tcp;
        let report = validate(&decl);
        assert!(report.errors.iter().any(|e| e.message.contains("tcp")));
    }

    #[test]
    fn test_bad_instance_type() {
        let mut decl = Declaration::default();
        decl.instance.instance_type = InstanceType::of("T3A", "medium");
        let report = validate(&decl);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "instance.type");
    }

    #[test]
    fn test_schedule_out_of_range() {
        let mut decl = Declaration::default();
        decl.backup.rule.schedule.hour = 24;
        decl.backup.rule.schedule.minute = 60;
        let report = validate(&decl);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_backup_windows() {
        let mut decl = Declaration::default();
        decl.backup.rule.start_window_minutes = 30;
        decl.backup.rule.completion_window_minutes = 30;
        decl.backup.rule.delete_after_days = 0;
        let report = validate(&decl);
        let fields: Vec<_> = report.errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "backup.retain-days",
                "backup.start-window-minutes",
                "backup.completion-window-minutes"
            ]
        );
    }

    #[test]
    fn test_relative_secret_name() {
        let mut decl = Declaration::default();
        decl.secret = SecretRef::new("valheim/server-password");
        assert!(!validate(&decl).is_ok());
    }

    #[test]
    fn test_subnet_larger_than_vpc() {
        let mut decl = Declaration::default();
        decl.network.subnet_mask = 12;
        let report = validate(&decl);
        assert_eq!(report.errors[0].field, "network.subnet-mask");
    }

    fn with_cidr(cidr: &str) -> ValidationReport {
        let mut decl = Declaration::default();
        decl.network.cidr = cidr.to_string();
        validate(&decl)
    }

    #[test]
    fn test_cidr_must_be_an_address() {
        let report = with_cidr("not-an-ip/16");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].field, "network.cidr");
    }

    #[test]
    fn test_cidr_prefix_range() {
        let report = with_cidr("10.0.0.0/8");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("/16 to /28"));

        assert!(!with_cidr("10.0.0.0/29").is_ok());
        assert!(with_cidr("10.0.0.0/24").is_ok());
    }

    #[test]
    fn test_cidr_host_bits() {
        let report = with_cidr("10.0.0.5/16");
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("use 10.0.0.0/16"));

        let fields: Vec<_> = with_cidr("10.0.0.5/8").errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["network.cidr", "network.cidr"]);
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding {
            field: "ports",
            message: "bad".to_string(),
        };
        assert_eq!(finding.to_string(), "ports: bad");
    }
}
