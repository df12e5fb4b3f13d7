use crate::utils;
use colored::Colorize;
use std::path::PathBuf;
use valheim_stack_cloud::{Snapshot, SnapshotStore};
use valheim_stack_core::synthesize;

pub async fn handle(file: Option<PathBuf>, output: Option<PathBuf>, write: bool) -> anyhow::Result<()> {
    let decl = utils::load_declaration(file)?;
    let template = synthesize(&decl);
    let json = template.to_json_pretty()?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &json).await?;
            eprintln!(
                "{} {}",
                "✓ Template written to".green(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{json}"),
    }

    if write {
        let store = SnapshotStore::new(std::env::current_dir()?);
        store.save(&Snapshot::new(&decl.stack_name, template)).await?;
        eprintln!(
            "{} {}",
            "✓ Snapshot recorded at".green(),
            store.snapshot_path().display().to_string().cyan()
        );
    }

    Ok(())
}
