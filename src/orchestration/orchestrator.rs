//! Multi-target publish orchestration
//!
//! The orchestrator runs all validation before any remote call: eligibility,
//! artifact resolution, the archive manifest check and the content scan all
//! pass first, so a run never leaves one platform updated after another was
//! doomed from the start. Targets then run sequentially, and a failure on
//! one never stops the others.

use crate::core::descriptor::{ReleaseDescriptor, Target};
use crate::core::error::PublishError;
use crate::core::resolver::ValueResolver;
use crate::core::traits::{PublishTarget, ReleaseReport, TargetOutcome, TargetReport};
use crate::security::credentials::mask_token;
use crate::security::scanner::ContentScanner;
use crate::targets::{CurseforgeExecutor, GithubExecutor, ModrinthExecutor};
use crate::targets::curseforge::HttpCurseforgeClient;
use crate::targets::github::HttpGithubClient;
use crate::targets::modrinth::HttpModrinthClient;
use crate::validation::{archive_validator, eligibility};
use secrecy::ExposeSecret;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Drives one release across every eligible target
pub struct Orchestrator {
    resolver: ValueResolver,
    scanner: Option<Box<dyn ContentScanner>>,
    targets: Vec<Box<dyn PublishTarget>>,
}

impl Orchestrator {
    /// Orchestrator wired to the real platform APIs
    pub fn new() -> Self {
        let targets: Vec<Box<dyn PublishTarget>> = vec![
            Box::new(CurseforgeExecutor::new(Arc::new(
                HttpCurseforgeClient::new(),
            ))),
            Box::new(ModrinthExecutor::new(Arc::new(HttpModrinthClient::new()))),
            Box::new(GithubExecutor::new(Arc::new(HttpGithubClient::new()))),
        ];

        Self {
            resolver: ValueResolver::new(),
            scanner: None,
            targets,
        }
    }

    /// Orchestrator over explicit target implementations
    pub fn with_targets(targets: Vec<Box<dyn PublishTarget>>) -> Self {
        Self {
            resolver: ValueResolver::new(),
            scanner: None,
            targets,
        }
    }

    pub fn with_scanner(mut self, scanner: Box<dyn ContentScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Validate the release without touching any remote API
    pub async fn check(&self, descriptor: &ReleaseDescriptor) -> Result<Vec<Target>, PublishError> {
        let eligible = eligibility::resolve(descriptor)?;
        let artifact = self.resolver.resolve_file(&descriptor.artifact).await?;
        self.validate_artifact(descriptor, &artifact).await?;

        Ok(eligible)
    }

    /// Run the full publish workflow
    pub async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
    ) -> Result<ReleaseReport, PublishError> {
        // All of pre-flight happens before the first remote mutation
        let eligible = eligibility::resolve(descriptor)?;
        let artifact = self.resolver.resolve_file(&descriptor.artifact).await?;
        self.validate_artifact(descriptor, &artifact).await?;

        println!(
            "🚀 Publishing {} to: {}",
            artifact.display(),
            eligible
                .iter()
                .map(Target::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        for target in &eligible {
            if let Some(token) = descriptor.credentials.for_target(*target) {
                println!("🔑 [{target}] using token {}", mask_token(token.expose_secret()));
            }
        }

        let mut report = ReleaseReport::default();

        for target in eligible {
            let Some(executor) = self.targets.iter().find(|e| e.target() == target) else {
                continue;
            };

            let started = Instant::now();
            let outcome = match executor.publish(descriptor, &artifact).await {
                Ok(outcome) => outcome,
                Err(e) => TargetOutcome::Failed {
                    error: e.to_string(),
                },
            };

            match &outcome {
                TargetOutcome::Published { url, .. } => {
                    let suffix = url.as_deref().map(|u| format!(" ({u})")).unwrap_or_default();
                    println!("✅ [{target}] published{suffix}");
                }
                TargetOutcome::DebugDryRun => {
                    println!("🐛 [{target}] debug mode, nothing uploaded");
                }
                TargetOutcome::Skipped { reason } => {
                    println!("⏭️  [{target}] skipped: {reason}");
                }
                TargetOutcome::Failed { error } => {
                    eprintln!("❌ [{target}] failed: {error}");
                }
            }

            report.push(TargetReport {
                target,
                outcome,
                elapsed_ms: started.elapsed().as_millis() as i64,
            });
        }

        self.print_summary(&report);
        Ok(report)
    }

    async fn validate_artifact(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
    ) -> Result<(), PublishError> {
        if !descriptor.flags.disable_jar_check {
            archive_validator::check_loader_manifests(artifact, &descriptor.loaders)?;
        }

        if !descriptor.flags.disable_malware_scanner {
            if let Some(scanner) = &self.scanner {
                scanner.scan(artifact).await?;
            }
        }

        Ok(())
    }

    fn print_summary(&self, report: &ReleaseReport) {
        let published = report.published_count();
        let failed = report.failed_count();

        if failed == 0 {
            println!("🎉 Done: {published} published, {failed} failed");
        } else {
            eprintln!(
                "💥 Done with errors: {published} published, {failed} failed"
            );
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
