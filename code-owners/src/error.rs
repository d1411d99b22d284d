use std::{io, path::PathBuf, process::ExitStatus};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fatal errors for an ownership resolution run. Per-line parse problems are
/// not errors at this level; they are collected in
/// [`crate::parser::ParseResult::errors`] instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("CODEOWNERS file does not exist (searched {})", searched.display())]
    CodeownersNotFound { searched: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not determine repository root: {0}")]
    RepoRoot(String),

    #[error("failed to run git: {0}")]
    GitSpawn(#[source] io::Error),

    #[error("`{command}` exited with {status}: {stderr}")]
    GitFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("malformed check-ignore output: {0}")]
    MalformedOutput(String),

    #[error("check-ignore reported line {line}, which is not an ownership rule")]
    UnknownRuleLine { line: usize },

    #[error(transparent)]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
