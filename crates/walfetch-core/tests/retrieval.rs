use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use walfetch_config::{EscapeMode, RetrieveConfig};
use walfetch_core::{
    CommandExecutor, CommandStatus, ExecError, ExpandedCommand, PathError, RetrievalService,
    RetrieveError, ShellExecutor, native_separators,
};
use walfetch_telemetry::Metrics;

const SEGMENT: &str = "000000010000000000000001";

/// Records every command and answers with a fixed exit code.
struct SpyExecutor {
    code: i32,
    calls: Mutex<Vec<String>>,
}

impl SpyExecutor {
    fn exiting(code: i32) -> Arc<Self> {
        Arc::new(Self {
            code,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl CommandExecutor for SpyExecutor {
    fn execute(&self, command: &ExpandedCommand) -> Result<CommandStatus, ExecError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(command.as_str().to_string());
        }
        Ok(CommandStatus::from_code(self.code))
    }
}

fn copy_config() -> RetrieveConfig {
    RetrieveConfig::new("cp %a/%f %p", "/archive").with_log_dir("/pgdata/pg_xlog")
}

#[test]
fn documented_copy_command_is_executed() -> Result<()> {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(copy_config(), spy.clone());

    service.retrieve(SEGMENT)?;

    let expected = format!(
        "cp {}/{SEGMENT} {}",
        native_separators("/archive"),
        native_separators(&format!("/pgdata/pg_xlog/{SEGMENT}"))
    );
    assert_eq!(spy.calls(), vec![expected]);
    Ok(())
}

#[test]
fn missing_template_never_invokes_executor() {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(RetrieveConfig::default(), spy.clone());

    let err = service.retrieve("seg1").unwrap_err();

    assert!(matches!(err, RetrieveError::ConfigurationMissing));
    assert!(spy.calls().is_empty());
}

#[test]
fn blank_template_counts_as_missing() {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(RetrieveConfig::new("  ", "/archive"), spy.clone());

    assert!(matches!(
        service.retrieve("seg1"),
        Err(RetrieveError::ConfigurationMissing)
    ));
    assert!(spy.calls().is_empty());
}

#[test]
fn exit_zero_returns_canonical_path() -> Result<()> {
    let service = RetrievalService::new(copy_config(), SpyExecutor::exiting(0));

    let retrieved = service.retrieve(SEGMENT)?;

    assert_eq!(retrieved.path, service.canonical_path(SEGMENT)?);
    assert!(!retrieved.command.is_truncated());
    Ok(())
}

#[test]
fn nonzero_exit_returns_no_path_and_leaves_caller_state() {
    for code in [1, 2, 127, -1] {
        let service = RetrievalService::new(copy_config(), SpyExecutor::exiting(code));
        let mut restored: Option<PathBuf> = Some(PathBuf::from("previous"));

        match service.retrieve(SEGMENT) {
            Ok(retrieved) => restored = Some(retrieved.path.into_path_buf()),
            Err(RetrieveError::RetrievalFailed { status, command }) => {
                assert_eq!(status.code(), Some(code));
                assert!(command.as_str().starts_with("cp "));
            }
            Err(other) => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(restored, Some(PathBuf::from("previous")));
    }
}

#[test]
fn missing_interpreter_is_a_failed_retrieval() -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new()?;
    let executor = Arc::new(ShellExecutor::with_interpreter(
        "walfetch-missing-interpreter",
        "-c",
    ));
    let service = RetrievalService::new(copy_config(), executor).with_metrics(metrics.clone());

    let err = service.retrieve(SEGMENT).unwrap_err();

    let expected = service.expand_for(SEGMENT)?.command;
    assert_eq!(err.command(), Some(&expected));
    assert!(!err.is_rejection());
    assert!(matches!(
        err,
        RetrieveError::Launch {
            source: ExecError::Launch { ref program, .. },
            ..
        } if program == "walfetch-missing-interpreter"
    ));
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.retrievals_failed, 1);
    assert_eq!(snapshot.retrievals_rejected, 0);
    assert_eq!(snapshot.retrievals_succeeded, 0);
    Ok(())
}

#[test]
fn retrieve_is_idempotent_with_pure_executor() -> Result<()> {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(copy_config(), spy.clone());

    let first = service.retrieve(SEGMENT)?;
    let second = service.retrieve(SEGMENT)?;

    assert_eq!(first, second);
    let calls = spy.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1]);

    let failing = RetrievalService::new(copy_config(), SpyExecutor::exiting(3));
    assert!(failing.retrieve(SEGMENT).is_err());
    assert!(failing.retrieve(SEGMENT).is_err());
    Ok(())
}

#[test]
fn oversized_filename_is_a_path_overflow() {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(copy_config(), spy.clone());

    let err = service.retrieve(&"0".repeat(4096)).unwrap_err();

    assert!(matches!(
        err,
        RetrieveError::Path {
            source: PathError::PathOverflow {
                capacity: 1024,
                ..
            }
        }
    ));
    assert!(spy.calls().is_empty());
}

#[test]
fn long_values_truncate_command_within_capacity() -> Result<()> {
    let spy = SpyExecutor::exiting(0);
    let config = RetrieveConfig::new("fetch %a %f %p", "a".repeat(5000))
        .with_log_dir("/pgdata/pg_xlog")
        .with_max_command_len(256);
    let service = RetrievalService::new(config, spy.clone());

    let retrieved = service.retrieve(SEGMENT)?;

    assert!(retrieved.command.is_truncated());
    assert_eq!(retrieved.command.len(), 255);
    assert_eq!(spy.calls()[0].len(), 255);
    Ok(())
}

#[test]
fn escaped_filenames_reach_executor_quoted() -> Result<()> {
    let spy = SpyExecutor::exiting(0);
    let config = RetrieveConfig::new("fetch %f", "/archive").with_escape(EscapeMode::Shell);
    let service = RetrievalService::new(config, spy.clone());

    service.retrieve("seg;reboot")?;

    assert_eq!(spy.calls(), vec!["fetch 'seg;reboot'".to_string()]);
    Ok(())
}

#[test]
fn expand_for_runs_nothing() -> Result<()> {
    let spy = SpyExecutor::exiting(0);
    let service = RetrievalService::new(copy_config(), spy.clone());

    let prepared = service.expand_for(SEGMENT)?;

    assert!(prepared.command.as_str().starts_with("cp "));
    assert!(spy.calls().is_empty());
    Ok(())
}

#[cfg(unix)]
mod shell {
    use super::*;
    use std::fs;

    #[test]
    fn shell_copy_stages_segment_and_cleanup_disposes_it() -> Result<()> {
        let archive = tempfile::tempdir()?;
        let log_dir = tempfile::tempdir()?;
        fs::write(archive.path().join(SEGMENT), b"wal bytes")?;

        let config = RetrieveConfig::new(
            "cp %a/%f %p",
            archive.path().to_string_lossy().into_owned(),
        )
        .with_log_dir(log_dir.path());
        let service = RetrievalService::with_shell(config);

        let retrieved = service.retrieve(SEGMENT)?;
        assert_eq!(fs::read(retrieved.path.as_path())?, b"wal bytes");

        let mut staged = true;
        let report = service.cleanup(staged, retrieved.path.as_path());
        staged = report.staged();
        assert!(!staged);
        assert!(!retrieved.path.as_path().exists());
        Ok(())
    }

    #[test]
    fn shell_failure_is_reported_without_path() -> Result<()> {
        let archive = tempfile::tempdir()?;
        let log_dir = tempfile::tempdir()?;
        let config = RetrieveConfig::new(
            "cp %a/%f %p",
            archive.path().to_string_lossy().into_owned(),
        )
        .with_log_dir(log_dir.path());
        let service = RetrievalService::with_shell(config);

        let err = service.retrieve(SEGMENT).unwrap_err();

        assert!(matches!(err, RetrieveError::RetrievalFailed { .. }));
        assert!(!log_dir.path().join(SEGMENT).exists());
        Ok(())
    }
}
