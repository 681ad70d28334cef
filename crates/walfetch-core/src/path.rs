//! Canonical local paths for retrieved segments.
//!
//! # Design
//! - The segment name is appended to the log directory, never resolved as a path.
//! - Paths that would not fit their capacity are an error; they are never truncated.

use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};

use crate::error::PathError;

/// Convert `/` separators to the host's native separator.
///
/// A no-op on hosts whose native separator is already `/`.
#[must_use]
pub fn native_separators(value: &str) -> Cow<'_, str> {
    if MAIN_SEPARATOR == '/' || !value.contains('/') {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.replace('/', MAIN_SEPARATOR_STR))
    }
}

/// Path at which a retrieved segment must reside, rooted at the log directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Borrow the path as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Borrow the path as a filesystem path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Consume into an owned filesystem path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        PathBuf::from(self.0)
    }
}

impl Display for CanonicalPath {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl AsRef<Path> for CanonicalPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// Composes `<log directory>/<segment>` within a fixed capacity.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    directory: PathBuf,
    capacity: usize,
}

impl PathBuilder {
    /// Builder rooted at `directory`; `capacity` counts a terminator byte.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            directory: directory.into(),
            capacity,
        }
    }

    /// Compose the canonical path for `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidFilename`] when `filename` could escape the
    /// directory, [`PathError::NonUnicodeDirectory`] when the directory is not
    /// text, and [`PathError::PathOverflow`] when the result exceeds
    /// `capacity - 1` bytes.
    pub fn build(&self, filename: &str) -> Result<CanonicalPath, PathError> {
        check_filename(filename)?;
        let directory = self
            .directory
            .to_str()
            .ok_or_else(|| PathError::NonUnicodeDirectory {
                directory: self.directory.clone(),
            })?;

        let mut joined = String::with_capacity(directory.len() + filename.len() + 1);
        joined.push_str(directory);
        if !directory.is_empty() && !directory.ends_with(['/', MAIN_SEPARATOR]) {
            joined.push('/');
        }
        joined.push_str(filename);
        let joined = native_separators(&joined).into_owned();

        let limit = self.capacity.saturating_sub(1);
        if joined.len() > limit {
            return Err(PathError::PathOverflow {
                len: joined.len(),
                capacity: self.capacity,
            });
        }
        Ok(CanonicalPath(joined))
    }
}

fn check_filename(filename: &str) -> Result<(), PathError> {
    let reason = if filename.is_empty() {
        Some("empty")
    } else if filename == "." || filename == ".." {
        Some("relative_component")
    } else if filename.contains('/') || (cfg!(windows) && filename.contains('\\')) {
        Some("contains_separator")
    } else if filename.contains('\0') {
        Some("contains_nul")
    } else {
        None
    };
    reason.map_or(Ok(()), |reason| {
        Err(PathError::InvalidFilename {
            filename: filename.to_string(),
            reason,
        })
    })
}
