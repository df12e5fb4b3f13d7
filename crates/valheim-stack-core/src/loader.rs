//! Declaration loader
//!
//! Reads a declaration file, expands variables, then parses the KDL.

use crate::error::Result;
use crate::model::Declaration;
use crate::parser::parse_kdl_string;
use crate::template::TemplateProcessor;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Load a declaration file
///
/// Variables come from a sibling `.env` file (if any) and from `VALHEIM_*`
/// environment variables. Environment variables win.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_declaration(path: &Path) -> Result<Declaration> {
    let mut processor = TemplateProcessor::new();

    if let Some(env_file) = path.parent().map(|dir| dir.join(".env")) {
        if env_file.is_file() {
            debug!(env_file = %env_file.display(), "Found .env file");
            processor.add_env_file_variables(&env_file)?;
        }
    }
    processor.add_env_variables();

    let expanded = processor.render_file(path)?;
    debug!(content_size = expanded.len(), "Template expansion complete");

    let decl = parse_kdl_string(&expanded)?;
    info!(stack = %decl.stack_name, "Loaded declaration");
    Ok(decl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackError;
    use serial_test::serial;
    use std::fs;

    #[test]
    #[serial]
    fn test_load_plain_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("valheim.kdl");
        fs::write(&path, "ports 2456 2458\n").unwrap();

        let decl = load_declaration(&path).unwrap();
        assert_eq!(decl, Declaration::default());
    }

    #[test]
    #[serial]
    fn test_load_with_env_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "SERVER_NAME=from-dotenv\n").unwrap();
        let path = dir.path().join("valheim.kdl");
        fs::write(&path, "server {\n    name \"{{ SERVER_NAME }}\"\n}\n").unwrap();

        let decl = load_declaration(&path).unwrap();
        assert_eq!(decl.server.name, "from-dotenv");
    }

    #[test]
    #[serial]
    fn test_environment_overrides_env_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env"), "VALHEIM_WORLD=dotenv\n").unwrap();
        let path = dir.path().join("valheim.kdl");
        fs::write(&path, "server {\n    world \"{{ VALHEIM_WORLD }}\"\n}\n").unwrap();

        temp_env::with_var("VALHEIM_WORLD", Some("process"), || {
            let decl = load_declaration(&path).unwrap();
            assert_eq!(decl.server.world, "process");
        });
    }

    #[test]
    #[serial]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_declaration(&dir.path().join("absent.kdl"));
        assert!(matches!(result, Err(StackError::IoError { .. })));
    }
}
