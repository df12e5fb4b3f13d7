use crate::utils;
use colored::Colorize;
use std::path::PathBuf;
use valheim_stack_core::synthesize;

pub fn handle(file: Option<PathBuf>) -> anyhow::Result<()> {
    let decl = utils::load_declaration(file)?;
    let template = synthesize(&decl);

    println!("Outputs of {}:", decl.stack_name.cyan());
    for (name, output) in &template.outputs {
        println!(
            "  {} {}",
            name.bold(),
            output.description.as_deref().unwrap_or("").dimmed()
        );
    }
    Ok(())
}
