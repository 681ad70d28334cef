//! # Design
//!
//! - Provide structured, constant-message errors for retrieval and cleanup.
//! - Carry the expanded command on execution failures so callers can audit what ran.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::exec::CommandStatus;
use crate::expand::ExpandedCommand;

/// Result type for retrieval operations.
pub type RetrieveResult<T> = Result<T, RetrieveError>;

/// Failures while composing a canonical segment path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The joined path does not fit the configured capacity.
    #[error("canonical path exceeds capacity")]
    PathOverflow {
        /// Length in bytes the path would have had.
        len: usize,
        /// Configured capacity, terminator included.
        capacity: usize,
    },
    /// The segment name could be interpreted as a path.
    #[error("invalid segment filename")]
    InvalidFilename {
        /// Offending filename.
        filename: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The log directory cannot be rendered as text.
    #[error("log directory is not valid unicode")]
    NonUnicodeDirectory {
        /// Directory that failed conversion.
        directory: PathBuf,
    },
}

/// Failures raised by a [`crate::CommandExecutor`].
#[derive(Debug, Error)]
pub enum ExecError {
    /// The command interpreter could not be started.
    #[error("failed to launch command interpreter")]
    Launch {
        /// Interpreter that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
}

/// Failures surfaced by [`crate::RetrievalService::retrieve`].
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// No retrieve command template is configured.
    #[error("retrieve command is not configured")]
    ConfigurationMissing,
    /// Canonical path construction failed.
    #[error("canonical path construction failed")]
    Path {
        /// Underlying path error.
        #[from]
        source: PathError,
    },
    /// The expanded command was truncated and the policy forbids running it.
    #[error("expanded retrieve command was truncated")]
    ExpansionTruncated {
        /// The truncated command that was not executed.
        command: ExpandedCommand,
    },
    /// The command ran and exited with a non-zero or signal status.
    #[error("retrieve command failed")]
    RetrievalFailed {
        /// Termination status reported by the interpreter.
        status: CommandStatus,
        /// The command that ran.
        command: ExpandedCommand,
    },
    /// The command could not be launched at all.
    #[error("retrieve command could not be launched")]
    Launch {
        /// The command that was to run.
        command: ExpandedCommand,
        /// Underlying executor error.
        source: ExecError,
    },
}

impl RetrieveError {
    /// The expanded command tied to this failure, when expansion got that far.
    #[must_use]
    pub const fn command(&self) -> Option<&ExpandedCommand> {
        match self {
            Self::ExpansionTruncated { command }
            | Self::RetrievalFailed { command, .. }
            | Self::Launch { command, .. } => Some(command),
            Self::ConfigurationMissing | Self::Path { .. } => None,
        }
    }

    /// Whether the failure happened before anything was executed.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationMissing | Self::Path { .. } | Self::ExpansionTruncated { .. }
        )
    }
}

/// Failure to dispose of a staged segment.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Removing the file failed for a reason other than absence.
    #[error("failed to remove staged segment")]
    Remove {
        /// Path that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}
