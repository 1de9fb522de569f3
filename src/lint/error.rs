use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{dir:?} is outside of the workspace {workspace:?}")]
    OutOfBounds { dir: PathBuf, workspace: PathBuf },

    #[error("no {marker} found between {dir:?} and {workspace:?}")]
    NotFound {
        dir: PathBuf,
        workspace: PathBuf,
        marker: String,
    },

    #[error("Failed to resolve path {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Lint command is empty")]
    EmptyCommand,

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with unexpected status {status:?}: {stderr}")]
    UnexpectedStatus {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// The run was superseded and its process terminated.
    #[error("Lint run was cancelled")]
    Cancelled,

    #[error("I/O error while running lint command: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Malformed lint report: {0}")]
    MalformedReport(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LintError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error(transparent)]
    Translation(#[from] TranslationError),
}
