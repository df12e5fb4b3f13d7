use crate::utils;
use colored::Colorize;
use std::path::PathBuf;
use valheim_stack_cloud::{ActionType, Plan, SnapshotStore};
use valheim_stack_core::synthesize;

pub async fn handle(file: Option<PathBuf>, against: Option<PathBuf>) -> anyhow::Result<()> {
    let decl = utils::load_declaration(file)?;
    let desired = synthesize(&decl);

    let previous = match against {
        Some(path) => Some(SnapshotStore::load_template(&path).await?),
        None => SnapshotStore::new(std::env::current_dir()?)
            .load()
            .await?
            .map(|snapshot| snapshot.template),
    };

    if previous.is_none() {
        println!("{}", "No previous template, everything is new".yellow());
    }

    let plan = valheim_stack_cloud::diff(previous.as_ref(), &desired);
    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "✓ No changes".green().bold());
        return;
    }

    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        let symbol = match action.action_type {
            ActionType::Create => action.action_type.symbol().green(),
            ActionType::Update => action.action_type.symbol().yellow(),
            ActionType::Replace => action.action_type.symbol().magenta(),
            ActionType::Delete => action.action_type.symbol().red(),
            ActionType::NoOp => action.action_type.symbol().normal(),
        };
        println!(
            "  {} [{}] {} {}",
            symbol,
            action.scope,
            action.resource_id.cyan(),
            action.resource_type.dimmed()
        );
        if let Some(reasons) = action.details.get("requires_replacement") {
            println!("      requires replacement: {}", reasons);
        }
    }

    println!();
    println!("{}", plan.summary());
}
