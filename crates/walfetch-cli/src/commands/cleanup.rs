//! `cleanup` handler.

use std::io::Write;
use std::path::Path;

use anyhow::anyhow;
use walfetch_core::Cleanup;

use crate::error::{CliError, CliResult};

/// Prints the new staged flag, then fails only when removal itself failed.
pub(crate) fn handle_cleanup(
    cleanup: &Cleanup,
    path: &Path,
    staged: bool,
    out: &mut dyn Write,
) -> CliResult<()> {
    let report = cleanup.cleanup(staged, path);
    writeln!(out, "staged={}", report.staged())
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))?;
    report.into_result().map_err(CliError::operation)
}
