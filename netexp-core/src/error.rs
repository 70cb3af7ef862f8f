//! Error types.

use std::io;
use std::path::PathBuf;

use crate::stage::StageKind;

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),

    #[error("failed resetting workspace {}: {}", path.display(), reason)]
    WorkspaceReset { path: PathBuf, reason: String },

    #[error("stage `{stage}` exited unsuccessfully (code: {code:?})")]
    StageFailure { stage: StageKind, code: Option<i32> },

    #[error("failed spawning stage `{stage}`: {reason}")]
    StageSpawn { stage: StageKind, reason: String },

    #[error("missing artifact: {0}")]
    ArtifactMissing(String),
    #[error("corrupt artifact {name}: {reason}")]
    ArtifactCorrupt { name: String, reason: String },

    #[error("archive entry already exists: {0}")]
    ArchiveCollision(String),
    #[error("failed committing archive entry: {0}")]
    ArchivalFailure(String),

    #[error("failed rendering plot {name}: {reason}")]
    PlotRender { name: String, reason: String },
}
