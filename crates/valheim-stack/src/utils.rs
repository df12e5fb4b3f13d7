use colored::Colorize;
use std::path::PathBuf;
use valheim_stack_config::ConfigError;
use valheim_stack_core::Declaration;

/// Resolve the declaration to work on
///
/// An explicit `--file` must load. Without one, a discovered file is used
/// when present and the built-in defaults otherwise.
pub fn load_declaration(file: Option<PathBuf>) -> anyhow::Result<Declaration> {
    let path = match file {
        Some(path) => path,
        None => match valheim_stack_config::find_declaration_file() {
            Ok(path) => path,
            Err(ConfigError::DeclarationNotFound) => {
                tracing::debug!("No declaration file found, using defaults");
                return Ok(Declaration::default());
            }
            Err(e) => return Err(e.into()),
        },
    };

    eprintln!("📄 {}", path.display().to_string().cyan());
    Ok(valheim_stack_core::load_declaration(&path)?)
}
