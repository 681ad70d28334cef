//! Disposal of previously staged segment copies.
//!
//! # Design
//! - The caller owns the "segment is staged" flag; [`Cleanup::cleanup`] returns
//!   the new value instead of mutating a copy.
//! - Removal is a direct filesystem delete with `rm -f` semantics: a missing file
//!   counts as disposed.
//! - A failed removal keeps the flag set so the caller may retry.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walfetch_telemetry::{CleanupLabel, Metrics};

use crate::error::CleanupError;

/// What a cleanup call did.
#[derive(Debug)]
pub enum Removal {
    /// Nothing was staged; no side effect.
    Skipped,
    /// The file was removed.
    Removed,
    /// The file did not exist.
    NotFound,
    /// Removal failed.
    Failed(io::Error),
}

impl Removal {
    const fn label(&self) -> CleanupLabel {
        match self {
            Self::Skipped => CleanupLabel::Skipped,
            Self::Removed => CleanupLabel::Removed,
            Self::NotFound => CleanupLabel::NotFound,
            Self::Failed(_) => CleanupLabel::Failed,
        }
    }
}

/// Result of [`Cleanup::cleanup`]; store [`CleanupReport::staged`] as the new flag.
#[derive(Debug)]
#[must_use = "the returned staged flag replaces the caller's flag"]
pub struct CleanupReport {
    path: PathBuf,
    removal: Removal,
}

impl CleanupReport {
    /// New value of the caller's staged flag.
    #[must_use]
    pub const fn staged(&self) -> bool {
        matches!(self.removal, Removal::Failed(_))
    }

    /// What happened to the file.
    #[must_use]
    pub const fn removal(&self) -> &Removal {
        &self.removal
    }

    /// Path the cleanup was asked to dispose of.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a failed removal into an error.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::Remove`] when the removal failed.
    pub fn into_result(self) -> Result<(), CleanupError> {
        match self.removal {
            Removal::Failed(source) => Err(CleanupError::Remove {
                path: self.path,
                source,
            }),
            Removal::Skipped | Removal::Removed | Removal::NotFound => Ok(()),
        }
    }
}

/// Removes staged segment copies.
#[derive(Clone, Default)]
pub struct Cleanup {
    metrics: Option<Metrics>,
}

impl Cleanup {
    /// Cleanup without metrics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a metrics registry.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Remove `path` when `staged` is set and report the new flag.
    pub fn cleanup(&self, staged: bool, path: &Path) -> CleanupReport {
        let removal = if staged {
            remove(path)
        } else {
            Removal::Skipped
        };

        match &removal {
            Removal::Skipped => {}
            Removal::Removed => debug!(path = %path.display(), "staged segment removed"),
            Removal::NotFound => debug!(path = %path.display(), "staged segment already absent"),
            Removal::Failed(err) => warn!(
                path = %path.display(),
                error = %err,
                "failed to remove staged segment"
            ),
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_cleanup(removal.label());
        }

        CleanupReport {
            path: path.to_path_buf(),
            removal,
        }
    }
}

fn remove(path: &Path) -> Removal {
    match fs::remove_file(path) {
        Ok(()) => Removal::Removed,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Removal::NotFound,
        Err(err) => Removal::Failed(err),
    }
}
