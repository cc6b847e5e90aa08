//! GitHub release workflow
//!
//! Releases are looked up by tag. New releases are created as drafts, get
//! their assets attached, and are only flipped to published once every
//! upload has landed, so a half-finished release is never visible. The
//! createTag/createRelease/updateRelease policy guards decline mutations
//! they do not cover, reported as skips rather than errors.

use crate::core::descriptor::{ReleaseDescriptor, Target};
use crate::core::error::PublishError;
use crate::core::resolver::ValueResolver;
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::state_machine::{PublishPhase, PublishTracker};
use crate::core::traits::{PublishTarget, TargetOutcome};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const API_BASE: &str = "https://api.github.com";
const UPLOADS_BASE: &str = "https://uploads.github.com";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Release create/update request body
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GithubReleasePayload {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// The slice of a release object this workflow needs
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GithubRelease {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
}

/// Minimal client surface against the releases API
#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn get_release_by_tag(
        &self,
        token: &SecretString,
        repo: &str,
        tag: &str,
    ) -> Result<Option<GithubRelease>, PublishError>;

    async fn tag_exists(
        &self,
        token: &SecretString,
        repo: &str,
        tag: &str,
    ) -> Result<bool, PublishError>;

    async fn create_release(
        &self,
        token: &SecretString,
        repo: &str,
        payload: &GithubReleasePayload,
    ) -> Result<GithubRelease, PublishError>;

    async fn update_release(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
        payload: &GithubReleasePayload,
    ) -> Result<GithubRelease, PublishError>;

    /// Flip a draft release to published
    async fn publish_release(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
    ) -> Result<(), PublishError>;

    async fn upload_asset(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
        artifact: &Path,
    ) -> Result<(), PublishError>;
}

/// reqwest-backed client
pub struct HttpGithubClient {
    client: reqwest::Client,
    retry: RetryManager,
}

impl HttpGithubClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .user_agent("mod-publisher/0.1")
            .build()
            .unwrap_or_default();

        Self {
            client,
            retry: RetryManager::new(RetryOptions::default()),
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", token.expose_secret()))
            .header("Accept", "application/vnd.github+json")
    }

    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, PublishError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(PublishError::TargetAuth {
                target: Target::Github,
                message: format!("{context} returned HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::TargetUpload {
                target: Target::Github,
                message: format!("{context} returned HTTP {status}: {body}"),
            });
        }

        Ok(response)
    }
}

impl Default for HttpGithubClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GithubClient for HttpGithubClient {
    async fn get_release_by_tag(
        &self,
        token: &SecretString,
        repo: &str,
        tag: &str,
    ) -> Result<Option<GithubRelease>, PublishError> {
        let url = format!("{API_BASE}/repos/{repo}/releases/tags/{tag}");
        let response = self
            .request(reqwest::Method::GET, &url, token)
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::check_status(response, "release lookup").await?;
        let release = response
            .json::<GithubRelease>()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        Ok(Some(release))
    }

    async fn tag_exists(
        &self,
        token: &SecretString,
        repo: &str,
        tag: &str,
    ) -> Result<bool, PublishError> {
        let url = format!("{API_BASE}/repos/{repo}/git/ref/tags/{tag}");
        let response = self
            .request(reqwest::Method::GET, &url, token)
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }

        Self::check_status(response, "tag lookup").await?;
        Ok(true)
    }

    async fn create_release(
        &self,
        token: &SecretString,
        repo: &str,
        payload: &GithubReleasePayload,
    ) -> Result<GithubRelease, PublishError> {
        let url = format!("{API_BASE}/repos/{repo}/releases");
        let response = self
            .request(reqwest::Method::POST, &url, token)
            .json(payload)
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        let response = Self::check_status(response, "release create").await?;
        response
            .json::<GithubRelease>()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))
    }

    async fn update_release(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
        payload: &GithubReleasePayload,
    ) -> Result<GithubRelease, PublishError> {
        let url = format!("{API_BASE}/repos/{repo}/releases/{release_id}");
        let response = self
            .request(reqwest::Method::PATCH, &url, token)
            .json(payload)
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        let response = Self::check_status(response, "release update").await?;
        response
            .json::<GithubRelease>()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))
    }

    async fn publish_release(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
    ) -> Result<(), PublishError> {
        let url = format!("{API_BASE}/repos/{repo}/releases/{release_id}");
        let response = self
            .request(reqwest::Method::PATCH, &url, token)
            .json(&serde_json::json!({ "draft": false }))
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Github, e))?;

        Self::check_status(response, "release publish").await?;
        Ok(())
    }

    async fn upload_asset(
        &self,
        token: &SecretString,
        repo: &str,
        release_id: u64,
        artifact: &Path,
    ) -> Result<(), PublishError> {
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let bytes = tokio::fs::read(artifact)
            .await
            .map_err(|e| PublishError::ArtifactNotFound {
                path: format!("{} ({e})", artifact.display()),
            })?;

        let url = format!(
            "{UPLOADS_BASE}/repos/{repo}/releases/{release_id}/assets?name={name}"
        );

        self.retry
            .retry(|| async {
                let response = self
                    .request(reqwest::Method::POST, &url, token)
                    .header("Content-Type", "application/octet-stream")
                    .body(bytes.clone())
                    .send()
                    .await
                    .map_err(|e| PublishError::remote(Target::Github, e))?;

                Self::check_status(response, "asset upload").await?;
                Ok(())
            })
            .await
    }
}

/// Drives the GitHub publish workflow
pub struct GithubExecutor {
    client: Arc<dyn GithubClient>,
    resolver: ValueResolver,
}

impl GithubExecutor {
    pub fn new(client: Arc<dyn GithubClient>) -> Self {
        Self {
            client,
            resolver: ValueResolver::new(),
        }
    }

    async fn run(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
        tracker: &mut PublishTracker,
    ) -> Result<TargetOutcome, PublishError> {
        let token = descriptor
            .credentials
            .for_target(Target::Github)
            .ok_or_else(|| PublishError::TargetAuth {
                target: Target::Github,
                message: "no API token configured".to_string(),
            })?;
        let repo = descriptor.github.repo.as_deref().ok_or_else(|| {
            PublishError::eligibility(Target::Github, "github repo is not defined")
        })?;
        let tag = descriptor
            .github
            .effective_tag(descriptor.version.as_deref())
            .ok_or_else(|| {
                PublishError::eligibility(Target::Github, "Neither version nor tag are defined")
            })?;
        tracker.advance(PublishPhase::AuthChecked);
        tracker.advance(PublishPhase::ArtifactResolved);

        let changelog = self
            .resolver
            .resolve_text(&descriptor.changelog)
            .await?
            .unwrap_or_default();
        let payload = GithubReleasePayload {
            tag_name: tag.to_string(),
            name: descriptor
                .effective_display_name()
                .unwrap_or(tag)
                .to_string(),
            body: changelog,
            draft: true,
            prerelease: descriptor.channel.is_prerelease(),
        };
        tracker.advance(PublishPhase::PayloadBuilt);

        if descriptor.flags.debug {
            let pretty = serde_json::to_string_pretty(&payload)
                .map_err(|e| PublishError::remote(Target::Github, e))?;
            println!("🐛 [github] debug mode, payload:\n{pretty}");
            tracker.advance(PublishPhase::DebugShortCircuit);
            return Ok(TargetOutcome::DebugDryRun);
        }

        let existing = self.client.get_release_by_tag(token, repo, tag).await?;
        tracker.advance(PublishPhase::RemoteQueried);

        let (release, still_draft) = match existing {
            Some(release) => {
                if !descriptor.github.update_release {
                    return Ok(TargetOutcome::skipped(format!(
                        "updateRelease is disabled and a release already exists for tag '{tag}'"
                    )));
                }
                let updated = self
                    .client
                    .update_release(
                        token,
                        repo,
                        release.id,
                        &GithubReleasePayload {
                            draft: release.draft,
                            ..payload.clone()
                        },
                    )
                    .await?;
                // A pre-existing draft stays draft through the asset uploads
                (updated, release.draft)
            }
            None => {
                if !descriptor.github.create_release {
                    return Ok(TargetOutcome::skipped(format!(
                        "createRelease is disabled and no release exists for tag '{tag}'"
                    )));
                }
                if !descriptor.github.create_tag
                    && !self.client.tag_exists(token, repo, tag).await?
                {
                    return Ok(TargetOutcome::skipped(format!(
                        "createTag is disabled and tag '{tag}' does not exist"
                    )));
                }
                let created = self.client.create_release(token, repo, &payload).await?;
                (created, true)
            }
        };

        self.client
            .upload_asset(token, repo, release.id, artifact)
            .await?;
        for additional in &descriptor.additional_files {
            let result = async {
                let path = self.resolver.resolve_file(&additional.artifact).await?;
                self.client
                    .upload_asset(token, repo, release.id, &path)
                    .await
            }
            .await;
            if let Err(e) = result {
                eprintln!("⚠️  [github] additional asset upload failed: {e}");
            }
        }
        tracker.advance(PublishPhase::Uploaded);

        // Drafts only go public once every asset is attached
        if still_draft {
            self.client.publish_release(token, repo, release.id).await?;
        }
        tracker.advance(PublishPhase::PostProcessed);
        tracker.advance(PublishPhase::Done);

        Ok(TargetOutcome::published(
            release.html_url.clone(),
            Some(release.id.to_string()),
        ))
    }
}

#[async_trait]
impl PublishTarget for GithubExecutor {
    fn target(&self) -> Target {
        Target::Github
    }

    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
    ) -> Result<TargetOutcome, PublishError> {
        let mut tracker = PublishTracker::new(Target::Github);
        match self.run(descriptor, artifact, &mut tracker).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracker.fail(e.to_string());
                eprintln!("[github] workflow history:\n{}", tracker.history());
                Err(e)
            }
        }
    }
}
