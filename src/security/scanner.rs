//! Pre-upload artifact scanning
//!
//! Artifacts are handed to a scanner before anything is sent to a remote
//! API. The default implementation shells out to an external scanner binary;
//! tests and the `disableMalwareScanner` flag bypass it.

use crate::core::error::PublishError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Collaborator that inspects an artifact before upload
#[async_trait]
pub trait ContentScanner: Send + Sync {
    /// Returns `Ok` when the artifact is clean, `ScannerRejected` otherwise
    async fn scan(&self, artifact: &Path) -> Result<(), PublishError>;
}

/// Scanner backed by an external command. The artifact path is appended as
/// the last argument; a non-zero exit status rejects the artifact.
pub struct CommandScanner {
    program: String,
    args: Vec<String>,
}

impl CommandScanner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl ContentScanner for CommandScanner {
    async fn scan(&self, artifact: &Path) -> Result<(), PublishError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(artifact)
            .output()
            .await
            .map_err(|e| PublishError::ScannerRejected {
                path: artifact.display().to_string(),
                reason: format!("scanner '{}' could not be started: {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("scanner '{}' exited with {}", self.program, output.status)
            } else {
                stderr.trim().to_string()
            };

            return Err(PublishError::ScannerRejected {
                path: artifact.display().to_string(),
                reason,
            });
        }

        Ok(())
    }
}
