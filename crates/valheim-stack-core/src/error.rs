use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("KDL parse error: {0}")]
    KdlParse(#[from] kdl::KdlError),

    #[error("failed to read declaration: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error: {path}\nreason: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("invalid declaration: {0}")]
    InvalidConfig(String),

    #[error("template error: {file}\nreason: {message}")]
    TemplateError { file: PathBuf, message: String },

    #[error("template render error: {0}")]
    TemplateRenderError(String),

    #[error("invalid template document: {0}")]
    InvalidTemplate(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;
