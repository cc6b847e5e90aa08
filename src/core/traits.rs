//! Core abstractions for release publishing
//!
//! Every platform integration implements [`PublishTarget`]. The orchestrator
//! only sees this trait, which keeps per-platform quirks out of the workflow
//! and lets tests drive the pipeline with in-memory fakes.

use crate::core::descriptor::{ReleaseDescriptor, Target};
use crate::core::error::PublishError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

/// What happened to one target during a publish run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TargetOutcome {
    /// The release went out
    Published {
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        remote_id: Option<String>,
    },
    /// Debug mode: the payload was printed, nothing was sent
    DebugDryRun,
    /// A policy guard declined the upload without treating it as an error
    Skipped { reason: String },
    /// The target was attempted and failed
    Failed { error: String },
}

impl TargetOutcome {
    pub fn published(url: Option<String>, remote_id: Option<String>) -> Self {
        Self::Published { url, remote_id }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-target entry in the final report
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target: Target,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
    pub elapsed_ms: i64,
}

/// Aggregate result of a publish run across all eligible targets
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReleaseReport {
    pub reports: Vec<TargetReport>,
}

impl ReleaseReport {
    pub fn push(&mut self, report: TargetReport) {
        self.reports.push(report);
    }

    /// A run succeeds when no attempted target failed. Skips and debug
    /// dry-runs do not count against it.
    pub fn overall_success(&self) -> bool {
        !self.reports.iter().any(|r| r.outcome.is_failure())
    }

    pub fn published_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, TargetOutcome::Published { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_failure())
            .count()
    }
}

/// One publishing platform
///
/// Implementations own their HTTP clients and payload formats. The artifact
/// path handed to `publish` has already been resolved and validated.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    /// Which platform this implementation publishes to
    fn target(&self) -> Target;

    /// Run the full per-target workflow and report the outcome
    ///
    /// Returns `Err` only for failures worth aborting this target over.
    /// Policy-guard declines come back as `Ok(TargetOutcome::Skipped)`.
    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
    ) -> Result<TargetOutcome, PublishError>;
}
