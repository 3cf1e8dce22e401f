//! Error taxonomy for the archiving session.
//!
//! Collaborator errors (`CatalogLoadError`, `MoveError`) travel back to the
//! session unmodified; only the controller turns them into a session-ending
//! `AppError`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The project root could not be enumerated. Always fatal.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("cannot read project root {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("project root {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

/// A single relocation failed. Nothing was changed on disk.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("cannot create destination {}", path.display())]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination {} exists and is not a directory", .0.display())]
    DestinationNotDirectory(PathBuf),

    #[error("{} already exists", .0.display())]
    TargetExists(PathBuf),

    #[error("{} no longer exists", .0.display())]
    SourceMissing(PathBuf),

    #[error("cannot move {} to {}", from.display(), to.display())]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A completion event that does not belong to the move currently in flight.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("completion for item {got} ignored (in flight: {expected:?})")]
pub struct ProtocolViolation {
    pub got: usize,
    pub expected: Option<usize>,
}

/// Session-ending failures surfaced by the controller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    CatalogLoad(#[from] CatalogLoadError),

    #[error("failed to archive {name}")]
    Move {
        name: String,
        #[source]
        source: MoveError,
    },

    #[error("background task failed: {0}")]
    Task(String),
}

impl AppError {
    /// The error followed by its causes, joined like anyhow's `{:#}`.
    pub fn chain_message(&self) -> String {
        let mut msg = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            msg.push_str(": ");
            msg.push_str(&err.to_string());
            cause = err.source();
        }
        msg
    }
}
