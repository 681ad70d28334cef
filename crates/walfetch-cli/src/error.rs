//! CLI error type and exit code mapping.

use std::fmt::{self, Display, Formatter};

/// Distinguishes operator mistakes from failed operations and internal faults.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Bad arguments or configuration.
    Validation(String),
    /// The requested retrieval or cleanup did not succeed.
    Operation(anyhow::Error),
    /// Anything else, such as logging setup or output failures.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn operation(error: impl Into<anyhow::Error>) -> Self {
        Self::Operation(error.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Operation(_) => 1,
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Operation(error) | Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}
