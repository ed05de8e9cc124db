//! Fatal error type for a build run.
//!
//! Every condition that aborts a run is a [`LatexMkError`]. `main` logs an
//! exiting notice for it and terminates with a non-zero status.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Message appended when an external tool could not be started.
const NOT_IN_PATH_HINT: &str = "Is your latex distribution under your PATH?";

#[derive(Debug, Error)]
pub enum LatexMkError {
    #[error("Could not run command \"{0}\". {NOT_IN_PATH_HINT}")]
    ToolNotFound(String),

    /// Errors scanned from the compiler log (only fatal with exit-on-error).
    #[error("{0}")]
    Compile(String),

    #[error("{0}")]
    Project(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error when accessing `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LatexMkError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LatexMkError>;
