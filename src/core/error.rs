//! Error handling for mod release publishing
//!
//! This module provides the publishing error taxonomy using the thiserror
//! crate. Pre-flight errors abort the whole run; target errors are fatal for
//! their target only and are collected at the orchestrator boundary.

use crate::core::descriptor::Target;
use thiserror::Error;

/// Main error type for publishing operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Pre-flight errors, abort before any target runs
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("[{target}] {message}")]
    Eligibility { target: Target, message: String },

    // The artifact itself is suspect, fatal for every target sharing it
    #[error("Archive validation failed: {message}")]
    ArchiveValidation { message: String },

    #[error("Content scanner rejected {path}: {reason}")]
    ScannerRejected { path: String, reason: String },

    // Artifact resolution
    #[error("Cannot find file {path}")]
    ArtifactNotFound { path: String },

    // Target-scoped errors, fatal for that target only
    #[error("[{target}] Authentication failed: {message}")]
    TargetAuth { target: Target, message: String },

    #[error("[{target}] Not found: {message}")]
    TargetNotFound { target: Target, message: String },

    #[error("[{target}] Upload failed: {message}")]
    TargetUpload { target: Target, message: String },

    #[error("[{target}] Remote API error: {message}")]
    RemoteApi { target: Target, message: String },
}

impl PublishError {
    /// Target this error is scoped to, if any
    pub fn target(&self) -> Option<Target> {
        match self {
            Self::Eligibility { target, .. }
            | Self::TargetAuth { target, .. }
            | Self::TargetNotFound { target, .. }
            | Self::TargetUpload { target, .. }
            | Self::RemoteApi { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Whether this error must abort the whole invocation before any
    /// target is attempted
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Eligibility { .. }
                | Self::ArchiveValidation { .. }
                | Self::ScannerRejected { .. }
        )
    }

    /// Stable code for reporting
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Eligibility { .. } => "ELIGIBILITY_ERROR",
            Self::ArchiveValidation { .. } => "ARCHIVE_VALIDATION_FAILED",
            Self::ScannerRejected { .. } => "SCANNER_REJECTED",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::TargetAuth { .. } => "TARGET_AUTH_FAILED",
            Self::TargetNotFound { .. } => "TARGET_NOT_FOUND",
            Self::TargetUpload { .. } => "TARGET_UPLOAD_FAILED",
            Self::RemoteApi { .. } => "REMOTE_API_ERROR",
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn eligibility(target: Target, message: impl Into<String>) -> Self {
        Self::Eligibility {
            target,
            message: message.into(),
        }
    }

    pub fn remote(target: Target, message: impl std::fmt::Display) -> Self {
        Self::RemoteApi {
            target,
            message: message.to_string(),
        }
    }
}
