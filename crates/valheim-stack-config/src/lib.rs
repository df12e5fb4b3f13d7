pub mod error;

pub use error::*;

use std::path::{Path, PathBuf};

/// Environment variable naming a declaration file directly
pub const CONFIG_ENV: &str = "VALHEIM_STACK_CONFIG";

/// Project-local directory holding declarations and snapshots
pub const PROJECT_DIR: &str = ".valheim-stack";

const APP_DIR: &str = "valheim-stack";
const GLOBAL_FILE: &str = "valheim.kdl";
const CANDIDATES: [&str; 4] = [
    "valheim.local.kdl",
    ".valheim.local.kdl",
    "valheim.kdl",
    ".valheim.kdl",
];

/// valheim-stack's user config directory, created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join(APP_DIR);

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Find the declaration file for the current directory
///
/// See [`find_declaration_file_in`] for the search order.
pub fn find_declaration_file() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    find_declaration_file_in(&current_dir)
}

/// Find the declaration file starting from `dir`
///
/// Search order:
/// 1. `VALHEIM_STACK_CONFIG`, when it names an existing file
/// 2. `dir`: valheim.local.kdl, .valheim.local.kdl, valheim.kdl, .valheim.kdl
/// 3. `dir/.valheim-stack/`: same order
/// 4. `~/.config/valheim-stack/valheim.kdl`
pub fn find_declaration_file_in(dir: &Path) -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            tracing::debug!("Using declaration from {}: {}", CONFIG_ENV, path.display());
            return Ok(path);
        }
        tracing::warn!("{} points at missing file {}", CONFIG_ENV, path.display());
    }

    if let Some(path) = first_candidate(dir) {
        return Ok(path);
    }

    let project_dir = dir.join(PROJECT_DIR);
    if project_dir.is_dir()
        && let Some(path) = first_candidate(&project_dir)
    {
        return Ok(path);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join(APP_DIR).join(GLOBAL_FILE);
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::DeclarationNotFound)
}

fn first_candidate(dir: &Path) -> Option<PathBuf> {
    CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
