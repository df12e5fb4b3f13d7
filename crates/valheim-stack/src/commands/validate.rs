use crate::utils;
use colored::Colorize;
use std::path::PathBuf;
use valheim_stack_core::validate;

pub fn handle(file: Option<PathBuf>) -> anyhow::Result<()> {
    println!("{}", "Validating declaration...".blue());
    let decl = utils::load_declaration(file)?;
    let report = validate(&decl);

    for warning in &report.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    if report.is_ok() {
        println!("{}", "✓ Declaration is valid".green().bold());
        println!();
        println!("Summary:");
        println!("  Stack: {}", decl.stack_name.cyan());
        println!("  Instance: {}", decl.instance.instance_type);
        println!(
            "  Ports: {}",
            decl.ingress.ports.publish_spec(decl.ingress.protocol)
        );
        println!("  Backup: {}", decl.backup.rule.schedule.expression());
        return Ok(());
    }

    eprintln!();
    eprintln!("{}", "✗ Declaration errors".red().bold());
    for error in &report.errors {
        eprintln!("  {}", error);
    }
    std::process::exit(1);
}
