//! Typed configuration models.
//!
//! # Design
//! - `RetrieveConfig` is built once at startup and injected into the retrieval service.
//! - Pure data carrier; IO lives in `loader.rs` and checks in `validate.rs`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// How substituted placeholder values are inserted into the command template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapeMode {
    /// Insert values exactly as provided; quoting is the template author's job.
    #[default]
    Verbatim,
    /// Wrap every substituted value in POSIX single quotes.
    ///
    /// Only meaningful for POSIX shells; `cmd /C` does not treat single quotes
    /// as quoting.
    Shell,
}

/// What to do when an expanded command does not fit its capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Run the truncated command and report the truncation alongside the outcome.
    #[default]
    Execute,
    /// Fail the retrieval without running anything.
    Refuse,
}

/// Immutable snapshot of the retrieval configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrieveConfig {
    /// Command template containing `%p`, `%f`, `%a` and `%%` placeholders.
    pub retrieve_command: Option<String>,
    /// Archive-side base directory substituted for `%a`.
    pub archive_dir: String,
    /// Local log directory that roots every canonical segment path.
    pub log_dir: PathBuf,
    /// Capacity of the expanded command buffer, terminator included.
    pub max_command_len: usize,
    /// Capacity of the canonical path buffer, terminator included.
    pub max_path_len: usize,
    /// Quoting applied to substituted values.
    pub escape: EscapeMode,
    /// Behaviour when the expanded command is truncated.
    pub on_truncation: TruncationPolicy,
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            retrieve_command: None,
            archive_dir: String::new(),
            log_dir: PathBuf::from(defaults::LOG_DIR),
            max_command_len: defaults::MAX_COMMAND_LEN,
            max_path_len: defaults::MAX_PATH_LEN,
            escape: EscapeMode::default(),
            on_truncation: TruncationPolicy::default(),
        }
    }
}

impl RetrieveConfig {
    /// Build a configuration with the given template and archive directory.
    #[must_use]
    pub fn new(retrieve_command: impl Into<String>, archive_dir: impl Into<String>) -> Self {
        Self {
            retrieve_command: Some(retrieve_command.into()),
            archive_dir: archive_dir.into(),
            ..Self::default()
        }
    }

    /// Replace the local log directory.
    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// Replace the escape mode.
    #[must_use]
    pub const fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = escape;
        self
    }

    /// Replace the truncation policy.
    #[must_use]
    pub const fn with_truncation_policy(mut self, policy: TruncationPolicy) -> Self {
        self.on_truncation = policy;
        self
    }

    /// Replace the expanded command capacity.
    #[must_use]
    pub const fn with_max_command_len(mut self, capacity: usize) -> Self {
        self.max_command_len = capacity;
        self
    }

    /// Replace the canonical path capacity.
    #[must_use]
    pub const fn with_max_path_len(mut self, capacity: usize) -> Self {
        self.max_path_len = capacity;
        self
    }

    /// The configured template, treating blank strings as unset.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.retrieve_command
            .as_deref()
            .filter(|command| !command.trim().is_empty())
    }
}
