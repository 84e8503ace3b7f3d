use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("missing value for placeholder '{0}'")]
    MissingKey(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0:?} does not contain a JSON list")]
    NotAList(PathBuf),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid command: {0}")]
    InvalidCommand(String),
    #[error("command '{0}' already exists")]
    DuplicateName(String),
    #[error("command '{0}' is not a custom command")]
    NotEditable(String),
    #[error("command '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("cannot run '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: TemplateError,
    },
}
