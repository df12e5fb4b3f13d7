use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "No declaration file found. Looked in:\n\
        - current directory: valheim.local.kdl, .valheim.local.kdl, valheim.kdl, .valheim.kdl\n\
        - ./.valheim-stack/ directory\n\
        - ~/.config/valheim-stack/valheim.kdl\n\
        Set VALHEIM_STACK_CONFIG to point at a file directly"
    )]
    DeclarationNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
