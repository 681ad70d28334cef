//! Execution of expanded commands through the host command interpreter.
//!
//! # Design
//! - `CommandExecutor` is the seam between orchestration and the host process API;
//!   tests substitute recording or scripted executors.
//! - Only the termination status is examined; the filesystem is never inspected.
//! - Calls block until the child exits. No timeout is imposed here.
//! - Standard output is inherited unless the caller reserves its own stdout,
//!   in which case it is routed to stderr with [`StdoutTarget::Stderr`].

use std::fmt::{self, Display, Formatter};
use std::io;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::ExecError;
use crate::expand::ExpandedCommand;

/// Termination status of an executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandStatus {
    code: Option<i32>,
}

impl CommandStatus {
    /// Status for a command that exited with `code`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Status for a command terminated without an exit code (e.g. by a signal).
    #[must_use]
    pub const fn terminated() -> Self {
        Self { code: None }
    }

    /// Exit code, if the command exited normally.
    #[must_use]
    pub const fn code(self) -> Option<i32> {
        self.code
    }

    /// Exit code zero is the only success signal.
    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl Display for CommandStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(formatter, "exit code {code}"),
            None => formatter.write_str("terminated without exit code"),
        }
    }
}

/// Runs an expanded command and reports how it terminated.
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Launch`] when the command could not be started.
    fn execute(&self, command: &ExpandedCommand) -> Result<CommandStatus, ExecError>;
}

/// Destination of the interpreter's standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdoutTarget {
    /// Share the calling process's stdout.
    #[default]
    Inherit,
    /// Write to the calling process's stderr.
    Stderr,
}

/// Executor that hands the command line to the host shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: String,
    flag: String,
    stdout: StdoutTarget,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        if cfg!(windows) {
            Self::with_interpreter("cmd", "/C")
        } else {
            Self::with_interpreter("sh", "-c")
        }
    }
}

impl ShellExecutor {
    /// Executor using the platform's standard interpreter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor invoking `program flag <command>`.
    #[must_use]
    pub fn with_interpreter(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
            stdout: StdoutTarget::Inherit,
        }
    }

    /// Route the interpreter's stdout to `target`.
    #[must_use]
    pub const fn with_stdout(mut self, target: StdoutTarget) -> Self {
        self.stdout = target;
        self
    }

    /// Interpreter program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &ExpandedCommand) -> Result<CommandStatus, ExecError> {
        debug!(
            program = %self.program,
            command = %command,
            "spawning command interpreter"
        );
        let mut child = Command::new(&self.program);
        child.arg(&self.flag).arg(command.as_str());
        if self.stdout == StdoutTarget::Stderr {
            child.stdout(io::stderr());
        }
        let status = child
            .status()
            .map_err(|source| ExecError::Launch {
                program: self.program.clone(),
                source,
            })?;
        Ok(CommandStatus::from(status))
    }
}
