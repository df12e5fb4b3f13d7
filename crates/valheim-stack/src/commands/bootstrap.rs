use crate::utils;
use std::path::PathBuf;

pub fn handle(file: Option<PathBuf>, region: &str) -> anyhow::Result<()> {
    let decl = utils::load_declaration(file)?;
    println!("{}", decl.bootstrap_script().render(region));
    Ok(())
}
