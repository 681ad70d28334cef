//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes only the counters relevant to segment retrieval and cleanup.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Terminal state of a single retrieval call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalLabel {
    /// Command exited with status zero.
    Succeeded,
    /// Command exited non-zero or could not be launched.
    Failed,
    /// Retrieval was rejected before anything ran.
    Rejected,
}

impl RetrievalLabel {
    /// Label value recorded on `retrievals_total`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        }
    }
}

/// Result of a single cleanup call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupLabel {
    /// Nothing was staged.
    Skipped,
    /// File was removed.
    Removed,
    /// File was already gone.
    NotFound,
    /// Removal failed.
    Failed,
}

impl CleanupLabel {
    /// Label value recorded on `cleanups_total`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Removed => "removed",
            Self::NotFound => "not_found",
            Self::Failed => "failed",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    retrievals_total: IntCounterVec,
    cleanups_total: IntCounterVec,
    expansions_truncated_total: IntCounter,
}

/// Snapshot of the retrieval counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Retrievals whose command exited zero.
    pub retrievals_succeeded: u64,
    /// Retrievals whose command failed or could not launch.
    pub retrievals_failed: u64,
    /// Retrievals rejected before execution.
    pub retrievals_rejected: u64,
    /// Expanded commands that hit their capacity.
    pub expansions_truncated: u64,
    /// Files removed by cleanup.
    pub cleanups_removed: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let retrievals_total = IntCounterVec::new(
            Opts::new("retrievals_total", "WAL segment retrievals by outcome"),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "retrievals_total",
            source,
        })?;
        let cleanups_total = IntCounterVec::new(
            Opts::new("cleanups_total", "Staged segment cleanups by result"),
            &["result"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "cleanups_total",
            source,
        })?;
        let expansions_truncated_total = IntCounter::with_opts(Opts::new(
            "expansions_truncated_total",
            "Retrieve commands truncated to the configured capacity",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "expansions_truncated_total",
            source,
        })?;

        registry
            .register(Box::new(retrievals_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "retrievals_total",
                source,
            })?;
        registry
            .register(Box::new(cleanups_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "cleanups_total",
                source,
            })?;
        registry
            .register(Box::new(expansions_truncated_total.clone()))
            .map_err(|source| TelemetryError::MetricsRegister {
                name: "expansions_truncated_total",
                source,
            })?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                retrievals_total,
                cleanups_total,
                expansions_truncated_total,
            }),
        })
    }

    /// Count a finished retrieval.
    pub fn inc_retrieval(&self, outcome: RetrievalLabel) {
        self.inner
            .retrievals_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Count a finished cleanup.
    pub fn inc_cleanup(&self, result: CleanupLabel) {
        self.inner
            .cleanups_total
            .with_label_values(&[result.as_str()])
            .inc();
    }

    /// Count an expansion that hit its capacity.
    pub fn inc_expansion_truncated(&self) {
        self.inner.expansions_truncated_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let retrieval = |label: RetrievalLabel| {
            self.inner
                .retrievals_total
                .with_label_values(&[label.as_str()])
                .get()
        };
        MetricsSnapshot {
            retrievals_succeeded: retrieval(RetrievalLabel::Succeeded),
            retrievals_failed: retrieval(RetrievalLabel::Failed),
            retrievals_rejected: retrieval(RetrievalLabel::Rejected),
            expansions_truncated: self.inner.expansions_truncated_total.get(),
            cleanups_removed: self
                .inner
                .cleanups_total
                .with_label_values(&[CleanupLabel::Removed.as_str()])
                .get(),
        }
    }
}
