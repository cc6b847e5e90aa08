//! CurseForge upload workflow
//!
//! Uploads go to the project's upload-file endpoint as multipart requests:
//! a `metadata` JSON part describing the file and the file itself. Loaders
//! ride along in the game version list, which is how CurseForge models them.

use crate::core::descriptor::{ReleaseDescriptor, Target};
use crate::core::error::PublishError;
use crate::core::resolver::ValueResolver;
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::state_machine::{PublishPhase, PublishTracker};
use crate::core::traits::{PublishTarget, TargetOutcome};
use crate::normalize::curseforge as normalize;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://minecraft.curseforge.com";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// The `metadata` part of an upload request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurseUploadMetadata {
    pub changelog: String,
    pub changelog_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub release_type: String,
    pub game_versions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<CurseRelations>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CurseRelations {
    pub projects: Vec<normalize::CurseRelation>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: u64,
}

/// Build the metadata part for one file
pub fn build_metadata(
    descriptor: &ReleaseDescriptor,
    changelog: String,
    display_name: Option<String>,
) -> CurseUploadMetadata {
    let mut game_versions = normalize::game_versions(descriptor);
    game_versions.extend(normalize::loaders(&descriptor.loaders));

    let relations = normalize::relations(descriptor);
    let relations = if relations.is_empty() {
        None
    } else {
        Some(CurseRelations { projects: relations })
    };

    CurseUploadMetadata {
        changelog,
        changelog_type: "markdown".to_string(),
        display_name,
        release_type: descriptor.channel.as_str().to_string(),
        game_versions,
        relations,
    }
}

/// Minimal client surface against the upload API
#[async_trait]
pub trait CurseforgeClient: Send + Sync {
    /// Upload one file, returning the new file ID
    async fn upload_file(
        &self,
        token: &SecretString,
        project_id: &str,
        metadata: &CurseUploadMetadata,
        artifact: &Path,
    ) -> Result<u64, PublishError>;
}

/// reqwest-backed client
pub struct HttpCurseforgeClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryManager,
}

impl HttpCurseforgeClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .user_agent("mod-publisher/0.1")
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
            retry: RetryManager::new(RetryOptions::default()),
        }
    }
}

impl Default for HttpCurseforgeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CurseforgeClient for HttpCurseforgeClient {
    async fn upload_file(
        &self,
        token: &SecretString,
        project_id: &str,
        metadata: &CurseUploadMetadata,
        artifact: &Path,
    ) -> Result<u64, PublishError> {
        let metadata_json =
            serde_json::to_string(metadata).map_err(|e| PublishError::TargetUpload {
                target: Target::Curseforge,
                message: format!("Cannot serialize upload metadata: {e}"),
            })?;

        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let bytes = tokio::fs::read(artifact)
            .await
            .map_err(|e| PublishError::ArtifactNotFound {
                path: format!("{} ({e})", artifact.display()),
            })?;

        let url = format!(
            "{}/api/projects/{}/upload-file",
            self.base_url, project_id
        );

        let response = self
            .retry
            .retry(|| async {
                // The form is consumed per request, so rebuild it each attempt
                let form = reqwest::multipart::Form::new()
                    .text("metadata", metadata_json.clone())
                    .part(
                        "file",
                        reqwest::multipart::Part::bytes(bytes.clone())
                            .file_name(file_name.clone()),
                    );

                let response = self
                    .client
                    .post(&url)
                    .header("X-Api-Token", token.expose_secret())
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| PublishError::remote(Target::Curseforge, e))?;

                let status = response.status();
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(PublishError::TargetAuth {
                        target: Target::Curseforge,
                        message: format!("upload-file returned HTTP {status}"),
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(PublishError::TargetNotFound {
                        target: Target::Curseforge,
                        message: format!("project {project_id} was not found"),
                    });
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(PublishError::TargetUpload {
                        target: Target::Curseforge,
                        message: format!("upload-file returned HTTP {status}: {body}"),
                    });
                }

                response
                    .json::<UploadResponse>()
                    .await
                    .map_err(|e| PublishError::remote(Target::Curseforge, e))
            })
            .await?;

        Ok(response.id)
    }
}

/// Drives the CurseForge publish workflow
pub struct CurseforgeExecutor {
    client: Arc<dyn CurseforgeClient>,
    resolver: ValueResolver,
}

impl CurseforgeExecutor {
    pub fn new(client: Arc<dyn CurseforgeClient>) -> Self {
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
            .for_target(Target::Curseforge)
            .ok_or_else(|| PublishError::TargetAuth {
                target: Target::Curseforge,
                message: "no API token configured".to_string(),
            })?;
        let project_id = descriptor.curse_id.as_deref().ok_or_else(|| {
            PublishError::eligibility(Target::Curseforge, "curseId is not defined")
        })?;
        tracker.advance(PublishPhase::AuthChecked);
        tracker.advance(PublishPhase::ArtifactResolved);

        let changelog = self
            .resolver
            .resolve_text(&descriptor.changelog)
            .await?
            .unwrap_or_default();
        let metadata = build_metadata(
            descriptor,
            changelog,
            descriptor.effective_display_name().map(str::to_string),
        );
        tracker.advance(PublishPhase::PayloadBuilt);

        if descriptor.flags.debug {
            let pretty = serde_json::to_string_pretty(&metadata)
                .map_err(|e| PublishError::remote(Target::Curseforge, e))?;
            println!("🐛 [curseforge] debug mode, payload:\n{pretty}");
            tracker.advance(PublishPhase::DebugShortCircuit);
            return Ok(TargetOutcome::DebugDryRun);
        }

        let file_id = self
            .client
            .upload_file(token, project_id, &metadata, artifact)
            .await?;
        tracker.advance_with_note(PublishPhase::Uploaded, Some(format!("file id {file_id}")));

        for additional in &descriptor.additional_files {
            let result = self
                .upload_additional(descriptor, token, project_id, additional)
                .await;
            if let Err(e) = result {
                eprintln!("⚠️  [curseforge] additional file upload failed: {e}");
            }
        }
        tracker.advance(PublishPhase::PostProcessed);
        tracker.advance(PublishPhase::Done);

        Ok(TargetOutcome::published(None, Some(file_id.to_string())))
    }

    async fn upload_additional(
        &self,
        descriptor: &ReleaseDescriptor,
        token: &SecretString,
        project_id: &str,
        additional: &crate::core::descriptor::AdditionalFile,
    ) -> Result<u64, PublishError> {
        let path = self.resolver.resolve_file(&additional.artifact).await?;
        let changelog = match &additional.changelog {
            Some(source) => self.resolver.resolve_text(source).await?.unwrap_or_default(),
            None => String::new(),
        };

        let metadata = build_metadata(descriptor, changelog, additional.display_name.clone());
        self.client
            .upload_file(token, project_id, &metadata, &path)
            .await
    }
}

#[async_trait]
impl PublishTarget for CurseforgeExecutor {
    fn target(&self) -> Target {
        Target::Curseforge
    }

    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
    ) -> Result<TargetOutcome, PublishError> {
        let mut tracker = PublishTracker::new(Target::Curseforge);
        match self.run(descriptor, artifact, &mut tracker).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracker.fail(e.to_string());
                eprintln!("[curseforge] workflow history:\n{}", tracker.history());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{
        ApiCredentials, ArtifactRef, ChangelogSource, DependencySet, Environment, GithubOptions,
        ReleaseChannel, ReleaseFlags,
    };
    use std::sync::Mutex;

    struct RecordingClient {
        uploads: Mutex<Vec<CurseUploadMetadata>>,
        fail: bool,
    }

    impl RecordingClient {
        fn new() -> Self {
            Self {
                uploads: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl CurseforgeClient for RecordingClient {
        async fn upload_file(
            &self,
            _token: &SecretString,
            _project_id: &str,
            metadata: &CurseUploadMetadata,
            _artifact: &Path,
        ) -> Result<u64, PublishError> {
            if self.fail {
                return Err(PublishError::TargetUpload {
                    target: Target::Curseforge,
                    message: "upload-file returned HTTP 400".to_string(),
                });
            }
            self.uploads.lock().unwrap().push(metadata.clone());
            Ok(42)
        }
    }

    fn descriptor() -> ReleaseDescriptor {
        ReleaseDescriptor {
            artifact: ArtifactRef::path("mod.jar"),
            additional_files: Vec::new(),
            version: Some("1.0.0".to_string()),
            display_name: None,
            changelog: ChangelogSource::text("- Fixed a crash"),
            channel: ReleaseChannel::Beta,
            game_versions: vec!["1.20".to_string()],
            loaders: vec!["fabric".to_string(), "modloader".to_string()],
            environment: Environment::Client,
            java_versions: vec![17],
            curse_depends: DependencySet::default(),
            modrinth_depends: DependencySet::default(),
            flags: ReleaseFlags::default(),
            credentials: ApiCredentials {
                curseforge: Some(SecretString::from("cf-token")),
                ..Default::default()
            },
            curse_id: Some("123456".to_string()),
            modrinth_id: None,
            github: GithubOptions::default(),
        }
    }

    #[test]
    fn test_metadata_merges_versions_loaders_and_java() {
        let metadata = build_metadata(&descriptor(), "notes".to_string(), Some("v1".to_string()));

        assert_eq!(
            metadata.game_versions,
            vec![
                "1.20",
                "client",
                "Java 17",
                "fabric",
                "risugami's modloader"
            ]
        );
        assert_eq!(metadata.release_type, "beta");
        assert_eq!(metadata.changelog_type, "markdown");
        assert!(metadata.relations.is_none());
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let metadata = build_metadata(&descriptor(), String::new(), None);
        let json = serde_json::to_string(&metadata).unwrap();

        assert!(json.contains("\"changelogType\""));
        assert!(json.contains("\"gameVersions\""));
        assert!(json.contains("\"releaseType\""));
        assert!(!json.contains("\"displayName\""));
    }

    #[tokio::test]
    async fn test_publish_uploads_with_display_name_fallback() {
        let client = Arc::new(RecordingClient::new());
        let executor = CurseforgeExecutor::new(client.clone());

        let outcome = executor
            .publish(&descriptor(), Path::new("mod.jar"))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TargetOutcome::published(None, Some("42".to_string()))
        );
        let uploads = client.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        // No explicit display name, so the version fills in
        assert_eq!(uploads[0].display_name.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_debug_mode_skips_upload() {
        let client = Arc::new(RecordingClient::new());
        let executor = CurseforgeExecutor::new(client.clone());

        let mut desc = descriptor();
        desc.flags.debug = true;

        let outcome = executor.publish(&desc, Path::new("mod.jar")).await.unwrap();

        assert_eq!(outcome, TargetOutcome::DebugDryRun);
        assert!(client.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_propagates() {
        let client = Arc::new(RecordingClient {
            uploads: Mutex::new(Vec::new()),
            fail: true,
        });
        let executor = CurseforgeExecutor::new(client);

        let err = executor
            .publish(&descriptor(), Path::new("mod.jar"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "TARGET_UPLOAD_FAILED");
        assert_eq!(err.target(), Some(Target::Curseforge));
    }

    #[tokio::test]
    async fn test_missing_token_is_an_auth_error() {
        let executor = CurseforgeExecutor::new(Arc::new(RecordingClient::new()));

        let mut desc = descriptor();
        desc.credentials = ApiCredentials::default();

        let err = executor
            .publish(&desc, Path::new("mod.jar"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "TARGET_AUTH_FAILED");
    }
}
