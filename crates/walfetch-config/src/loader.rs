//! Configuration document loading and environment overlays.
//!
//! # Design
//! - Documents are YAML (`.yaml`/`.yml`) or JSON (`.json`), chosen by extension.
//! - Environment overrides are applied after the document so operators can
//!   swap the template without editing files.
//! - Lookups go through a closure so tests never mutate the process environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::RetrieveConfig;
use crate::validate::validate;

/// Overrides the retrieve command template.
pub const ENV_RETRIEVE_COMMAND: &str = "WALFETCH_RETRIEVE_COMMAND";
/// Overrides the archive directory substituted for `%a`.
pub const ENV_ARCHIVE_DIR: &str = "WALFETCH_ARCHIVE_DIR";
/// Overrides the local log directory.
pub const ENV_LOG_DIR: &str = "WALFETCH_LOG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Builder that assembles a validated [`RetrieveConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: RetrieveConfig,
    source: Option<PathBuf>,
}

impl ConfigLoader {
    /// Start from built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a configuration document on disk.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, has an unsupported
    /// extension, or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format =
            DocumentFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse_document(&raw, format, path)?;
        debug!(path = %path.display(), "loaded retrieve configuration");
        Ok(Self {
            config,
            source: Some(path.to_path_buf()),
        })
    }

    /// Overlay `WALFETCH_*` variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an override is present but not valid UTF-8.
    pub fn apply_env(self) -> ConfigResult<Self> {
        let mut overrides = Vec::new();
        for name in [ENV_RETRIEVE_COMMAND, ENV_ARCHIVE_DIR, ENV_LOG_DIR] {
            match env::var(name) {
                Ok(value) => overrides.push((name, value)),
                Err(env::VarError::NotPresent) => {}
                Err(env::VarError::NotUnicode(_)) => {
                    return Err(ConfigError::InvalidEnv {
                        name,
                        reason: "not_unicode",
                    });
                }
            }
        }
        Ok(self.apply_env_with(|name| {
            overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
        }))
    }

    /// Overlay overrides resolved through `lookup`.
    #[must_use]
    pub fn apply_env_with<F>(mut self, mut lookup: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(command) = lookup(ENV_RETRIEVE_COMMAND) {
            debug!(variable = ENV_RETRIEVE_COMMAND, "retrieve command overridden");
            self.config.retrieve_command = Some(command);
        }
        if let Some(archive_dir) = lookup(ENV_ARCHIVE_DIR) {
            debug!(variable = ENV_ARCHIVE_DIR, "archive directory overridden");
            self.config.archive_dir = archive_dir;
        }
        if let Some(log_dir) = lookup(ENV_LOG_DIR) {
            debug!(variable = ENV_LOG_DIR, "log directory overridden");
            self.config.log_dir = PathBuf::from(log_dir);
        }
        self
    }

    /// Path of the document this loader started from, if any.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Validate and return the assembled configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when a field fails validation.
    pub fn finish(self) -> ConfigResult<RetrieveConfig> {
        validate(&self.config)?;
        Ok(self.config)
    }
}

fn parse_document(raw: &str, format: DocumentFormat, path: &Path) -> ConfigResult<RetrieveConfig> {
    match format {
        DocumentFormat::Yaml => serde_yaml::from_str(raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        }),
        DocumentFormat::Json => serde_json::from_str(raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}
