//! `retrieve` and `expand` handlers.

use std::io::Write;

use anyhow::anyhow;
use tracing::warn;
use walfetch_core::{RetrievalService, RetrieveError};

use crate::error::{CliError, CliResult};

pub(crate) fn handle_retrieve(
    service: &RetrievalService,
    segment: &str,
    out: &mut dyn Write,
) -> CliResult<()> {
    let retrieved = service
        .retrieve(segment)
        .map_err(|err| classify(segment, err))?;
    writeln!(out, "{}", retrieved.path)
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

pub(crate) fn handle_expand(
    service: &RetrievalService,
    segment: &str,
    out: &mut dyn Write,
) -> CliResult<()> {
    let prepared = service
        .expand_for(segment)
        .map_err(|err| classify(segment, err))?;
    if prepared.command.is_truncated() {
        warn!(
            capacity = prepared.command.capacity(),
            "expanded command was truncated to capacity"
        );
    }
    writeln!(out, "{}", prepared.command)
        .map_err(|err| CliError::failure(anyhow!("failed to write output: {err}")))
}

/// Missing configuration and unusable names are operator errors; everything
/// after expansion is a failed retrieval.
fn classify(segment: &str, err: RetrieveError) -> CliError {
    let status = match &err {
        RetrieveError::RetrievalFailed { status, .. } => Some(status.to_string()),
        _ => None,
    };
    let rejected = matches!(
        err,
        RetrieveError::ConfigurationMissing | RetrieveError::Path { .. }
    );
    let mut error = anyhow::Error::new(err).context(format!("segment {segment}"));
    if let Some(status) = status {
        error = error.context(format!("command status: {status}"));
    }
    if rejected {
        CliError::validation(format!("{error:#}"))
    } else {
        CliError::operation(error)
    }
}
