//! Orchestration of a single segment retrieval.
//!
//! A call walks `Building → Expanding → Executing` and ends in success or
//! failure; nothing is carried between calls besides the injected configuration.

use std::path::Path;
use std::sync::Arc;

use tracing::{Span, debug, info, info_span, warn};
use walfetch_config::{RetrieveConfig, TruncationPolicy};
use walfetch_telemetry::{Metrics, RetrievalLabel};

use crate::cleanup::{Cleanup, CleanupReport};
use crate::error::{PathError, RetrieveError, RetrieveResult};
use crate::exec::{CommandExecutor, ShellExecutor};
use crate::expand::{ExpandedCommand, Expander, Placeholders, unknown_placeholders};
use crate::path::{CanonicalPath, PathBuilder};

/// Steps of a retrieval call, recorded on the tracing span.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetrievalStage {
    /// Composing the canonical path.
    Building,
    /// Expanding the template.
    Expanding,
    /// Running the command.
    Executing,
    /// The command exited zero.
    Succeeded,
    /// The call failed.
    Failed,
}

impl RetrievalStage {
    /// Stage name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Expanding => "expanding",
            Self::Executing => "executing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Canonical path and command prepared for a segment, not yet executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Where the segment must end up.
    pub path: CanonicalPath,
    /// The command that would run.
    pub command: ExpandedCommand,
}

/// A segment retrieved successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    /// Canonical local path of the retrieved segment.
    pub path: CanonicalPath,
    /// The command that ran; check [`ExpandedCommand::is_truncated`] for diagnostics.
    pub command: ExpandedCommand,
}

/// Fetches missing segments by running the configured retrieve command.
#[derive(Clone)]
pub struct RetrievalService {
    config: Arc<RetrieveConfig>,
    paths: PathBuilder,
    expander: Expander,
    executor: Arc<dyn CommandExecutor>,
    cleanup: Cleanup,
    metrics: Option<Metrics>,
}

impl RetrievalService {
    /// Build a service around `config`, running commands through `executor`.
    #[must_use]
    pub fn new(config: RetrieveConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        if let Some(template) = config.template() {
            let unknown = unknown_placeholders(template);
            if !unknown.is_empty() {
                warn!(
                    placeholders = ?unknown,
                    "retrieve command contains unrecognized placeholders; they pass through literally"
                );
            }
        }
        let paths = PathBuilder::new(config.log_dir.clone(), config.max_path_len);
        let expander = Expander::new(config.max_command_len).with_escape(config.escape);
        Self {
            config: Arc::new(config),
            paths,
            expander,
            executor,
            cleanup: Cleanup::new(),
            metrics: None,
        }
    }

    /// Build a service that runs commands through the host shell.
    #[must_use]
    pub fn with_shell(config: RetrieveConfig) -> Self {
        Self::new(config, Arc::new(ShellExecutor::new()))
    }

    /// Attach a metrics registry shared with cleanup.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.cleanup = Cleanup::new().with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// The configuration snapshot in use.
    #[must_use]
    pub fn config(&self) -> &RetrieveConfig {
        &self.config
    }

    /// Canonical path for `filename` inside the log directory.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the path cannot be composed.
    pub fn canonical_path(&self, filename: &str) -> Result<CanonicalPath, PathError> {
        self.paths.build(filename)
    }

    /// Build the path and command for `filename` without running anything.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::ConfigurationMissing`] when no template is set
    /// and [`RetrieveError::Path`] when the path cannot be composed.
    pub fn expand_for(&self, filename: &str) -> RetrieveResult<Prepared> {
        let template = self
            .config
            .template()
            .ok_or(RetrieveError::ConfigurationMissing)?;

        enter_stage(RetrievalStage::Building);
        let path = self.paths.build(filename)?;

        enter_stage(RetrievalStage::Expanding);
        let command = self.expander.expand(
            template,
            &Placeholders {
                path: path.as_str(),
                filename,
                archive_dir: &self.config.archive_dir,
            },
        );
        Ok(Prepared { path, command })
    }

    /// Retrieve `filename` into the log directory.
    ///
    /// Succeeds only when the command exits with status zero; the returned path
    /// is exactly what [`RetrievalService::canonical_path`] yields.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::ConfigurationMissing`] before doing any work when
    /// no template is configured, [`RetrieveError::Path`] for unusable names,
    /// [`RetrieveError::ExpansionTruncated`] when truncation is refused,
    /// [`RetrieveError::Launch`] when the interpreter cannot start, and
    /// [`RetrieveError::RetrievalFailed`] for any non-zero termination.
    pub fn retrieve(&self, filename: &str) -> RetrieveResult<Retrieved> {
        let span = info_span!("retrieve", segment = %filename, stage = tracing::field::Empty);
        let _entered = span.enter();

        let result = self.run(filename);
        match &result {
            Ok(retrieved) => {
                enter_stage(RetrievalStage::Succeeded);
                info!(path = %retrieved.path, "segment retrieved");
                self.count(RetrievalLabel::Succeeded);
            }
            Err(err) => {
                enter_stage(RetrievalStage::Failed);
                warn!(error = %err, "segment retrieval failed");
                self.count(if err.is_rejection() {
                    RetrievalLabel::Rejected
                } else {
                    RetrievalLabel::Failed
                });
            }
        }
        result
    }

    /// Dispose of a staged copy; store the report's flag as the new staged state.
    pub fn cleanup(&self, staged: bool, path: &Path) -> CleanupReport {
        self.cleanup.cleanup(staged, path)
    }

    fn run(&self, filename: &str) -> RetrieveResult<Retrieved> {
        let Prepared { path, command } = self.expand_for(filename)?;

        if command.is_truncated() {
            warn!(
                capacity = command.capacity(),
                command = %command,
                "retrieve command truncated to capacity"
            );
            if let Some(metrics) = &self.metrics {
                metrics.inc_expansion_truncated();
            }
            if self.config.on_truncation == TruncationPolicy::Refuse {
                return Err(RetrieveError::ExpansionTruncated { command });
            }
        }

        enter_stage(RetrievalStage::Executing);
        debug!(command = %command, "executing retrieve command");
        let status = match self.executor.execute(&command) {
            Ok(status) => status,
            Err(source) => return Err(RetrieveError::Launch { command, source }),
        };

        if status.success() {
            Ok(Retrieved { path, command })
        } else {
            debug!(status = %status, "retrieve command exited unsuccessfully");
            Err(RetrieveError::RetrievalFailed { status, command })
        }
    }

    fn count(&self, label: RetrievalLabel) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_retrieval(label);
        }
    }
}

fn enter_stage(stage: RetrievalStage) {
    Span::current().record("stage", stage.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::exec::CommandStatus;
    use crate::path::native_separators;
    use std::sync::Mutex;

    struct FixedExecutor {
        code: i32,
        seen: Mutex<Vec<String>>,
    }

    impl FixedExecutor {
        fn new(code: i32) -> Arc<Self> {
            Arc::new(Self {
                code,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen(&self) -> Vec<String> {
            self.seen
                .lock()
                .map(|guard| guard.clone())
                .unwrap_or_default()
        }
    }

    impl CommandExecutor for FixedExecutor {
        fn execute(&self, command: &ExpandedCommand) -> Result<CommandStatus, ExecError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(command.as_str().to_string());
            }
            Ok(CommandStatus::from_code(self.code))
        }
    }

    fn config() -> RetrieveConfig {
        RetrieveConfig::new("cp %a/%f %p", "/archive").with_log_dir("/pgdata/pg_xlog")
    }

    #[test]
    fn stages_have_stable_names() {
        assert_eq!(RetrievalStage::Building.as_str(), "building");
        assert_eq!(RetrievalStage::Expanding.as_str(), "expanding");
        assert_eq!(RetrievalStage::Executing.as_str(), "executing");
        assert_eq!(RetrievalStage::Succeeded.as_str(), "succeeded");
        assert_eq!(RetrievalStage::Failed.as_str(), "failed");
    }

    #[test]
    fn expand_for_builds_documented_command() -> RetrieveResult<()> {
        let service = RetrievalService::new(config(), FixedExecutor::new(0));
        let prepared = service.expand_for("000000010000000000000001")?;
        let expected = format!(
            "cp {}/000000010000000000000001 {}",
            native_separators("/archive"),
            native_separators("/pgdata/pg_xlog/000000010000000000000001")
        );
        assert_eq!(prepared.command.as_str(), expected);
        assert_eq!(
            prepared.path,
            service.canonical_path("000000010000000000000001")?
        );
        Ok(())
    }

    #[test]
    fn service_keeps_injected_configuration() {
        let service = RetrievalService::new(config().with_max_path_len(64), FixedExecutor::new(0));
        assert_eq!(service.config().max_path_len, 64);
        assert_eq!(service.config().archive_dir, "/archive");
        assert!(matches!(
            service.canonical_path(&"0".repeat(64)),
            Err(PathError::PathOverflow { capacity: 64, .. })
        ));
    }

    #[test]
    fn retrieve_counts_outcomes() -> Result<(), Box<dyn std::error::Error>> {
        let metrics = Metrics::new()?;
        let ok =
            RetrievalService::new(config(), FixedExecutor::new(0)).with_metrics(metrics.clone());
        let failing =
            RetrievalService::new(config(), FixedExecutor::new(1)).with_metrics(metrics.clone());
        let unconfigured = RetrievalService::new(RetrieveConfig::default(), FixedExecutor::new(0))
            .with_metrics(metrics.clone());

        ok.retrieve("seg1")?;
        assert!(failing.retrieve("seg1").is_err());
        assert!(unconfigured.retrieve("seg1").is_err());

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.retrievals_succeeded, 1);
        assert_eq!(snapshot.retrievals_failed, 1);
        assert_eq!(snapshot.retrievals_rejected, 1);
        Ok(())
    }

    #[test]
    fn refused_truncation_runs_nothing() {
        let executor = FixedExecutor::new(0);
        let config = config()
            .with_max_command_len(16)
            .with_truncation_policy(TruncationPolicy::Refuse);
        let service = RetrievalService::new(config, executor.clone());

        let err = service.retrieve("000000010000000000000001").unwrap_err();
        assert!(matches!(err, RetrieveError::ExpansionTruncated { ref command } if command.len() == 15));
        assert!(executor.seen().is_empty());
    }

    #[test]
    fn truncated_command_still_runs_by_default() -> Result<(), Box<dyn std::error::Error>> {
        let executor = FixedExecutor::new(0);
        let metrics = Metrics::new()?;
        let service = RetrievalService::new(config().with_max_command_len(16), executor.clone())
            .with_metrics(metrics.clone());

        let retrieved = service.retrieve("000000010000000000000001")?;
        assert!(retrieved.command.is_truncated());
        assert_eq!(executor.seen(), vec![retrieved.command.as_str().to_string()]);
        assert_eq!(metrics.snapshot().expansions_truncated, 1);
        Ok(())
    }
}
