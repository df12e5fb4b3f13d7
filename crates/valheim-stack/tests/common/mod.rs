#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
    config_home: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let config_home = tempfile::tempdir().unwrap();
        Self { root, config_home }
    }

    pub fn write_declaration(&self, content: &str) {
        self.write_file("valheim.kdl", content);
    }

    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.root.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.path().join(relative)
    }

    /// CLI command running inside the project, isolated from the user's config
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("valheim-stack").unwrap();
        cmd.current_dir(self.root.path())
            .env_remove("VALHEIM_STACK_CONFIG")
            .env_remove("VALHEIM_STACK_FILE")
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1");
        cmd
    }
}
