//! Modrinth version workflow
//!
//! Versions are looked up by version number first. A missing version is
//! created with one multipart POST to `/version` carrying the JSON `data`
//! part plus every file, primary first; an existing one gets its metadata
//! patched instead, so rerunning a release is safe. The staging API is
//! selected per release via the `useModrinthStaging` flag.

use crate::core::descriptor::{ReleaseDescriptor, Target};
use crate::core::error::PublishError;
use crate::core::resolver::ValueResolver;
use crate::core::retry::{RetryManager, RetryOptions};
use crate::core::state_machine::{PublishPhase, PublishTracker};
use crate::core::traits::{PublishTarget, TargetOutcome};
use crate::normalize::modrinth as normalize;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const API_BASE: &str = "https://api.modrinth.com/v2";
const STAGING_API_BASE: &str = "https://staging-api.modrinth.com/v2";
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// The `data` part of a version-create request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModrinthVersionData {
    pub name: String,
    pub version_number: String,
    pub changelog: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<normalize::ModrinthDependency>>,
    pub game_versions: Vec<String>,
    pub version_type: String,
    pub loaders: Vec<String>,
    pub featured: bool,
    pub project_id: String,
    pub file_parts: Vec<String>,
    pub primary_file: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    id: String,
}

/// The slice of a listed version the lookup needs
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ModrinthVersionSummary {
    pub id: String,
    pub version_number: String,
}

/// Metadata body for patching an existing version. The modify endpoint
/// cannot replace files, so none are carried here.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModrinthVersionPatch {
    pub name: String,
    pub changelog: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<normalize::ModrinthDependency>>,
    pub game_versions: Vec<String>,
    pub version_type: String,
    pub loaders: Vec<String>,
}

impl ModrinthVersionData {
    /// Metadata subset sent when updating an existing version
    pub fn as_patch(&self) -> ModrinthVersionPatch {
        ModrinthVersionPatch {
            name: self.name.clone(),
            changelog: self.changelog.clone(),
            dependencies: self.dependencies.clone(),
            game_versions: self.game_versions.clone(),
            version_type: self.version_type.clone(),
            loaders: self.loaders.clone(),
        }
    }
}

/// Build the data part, including the part names of every file to upload
pub fn build_version_data(
    descriptor: &ReleaseDescriptor,
    changelog: String,
    file_count: usize,
) -> Result<ModrinthVersionData, PublishError> {
    let project_id = descriptor.modrinth_id.clone().ok_or_else(|| {
        PublishError::eligibility(Target::Modrinth, "modrinthId is not defined")
    })?;
    let version = descriptor.version.clone().ok_or_else(|| {
        PublishError::eligibility(Target::Modrinth, "Version is not defined")
    })?;

    let game_versions = normalize::game_versions(descriptor);
    if game_versions.is_empty() {
        return Err(PublishError::TargetUpload {
            target: Target::Modrinth,
            message: "no game versions remain after filtering snapshot identifiers".to_string(),
        });
    }

    let file_parts: Vec<String> = (0..file_count)
        .map(|i| if i == 0 { "file".to_string() } else { format!("file_{i}") })
        .collect();

    Ok(ModrinthVersionData {
        name: descriptor
            .effective_display_name()
            .unwrap_or(version.as_str())
            .to_string(),
        version_number: version,
        changelog,
        dependencies: normalize::dependencies(descriptor),
        game_versions,
        version_type: descriptor.channel.as_str().to_string(),
        loaders: normalize::loaders(&descriptor.loaders),
        featured: false,
        project_id,
        primary_file: "file".to_string(),
        file_parts,
    })
}

/// Minimal client surface against the version API
#[async_trait]
pub trait ModrinthClient: Send + Sync {
    /// Versions already published on the project
    async fn list_versions(
        &self,
        token: &SecretString,
        staging: bool,
        project_id: &str,
    ) -> Result<Vec<ModrinthVersionSummary>, PublishError>;

    /// Create a version with the given files, returning the new version ID
    async fn create_version(
        &self,
        token: &SecretString,
        staging: bool,
        data: &ModrinthVersionData,
        files: &[PathBuf],
    ) -> Result<String, PublishError>;

    /// Patch the metadata of an existing version
    async fn update_version(
        &self,
        token: &SecretString,
        staging: bool,
        version_id: &str,
        patch: &ModrinthVersionPatch,
    ) -> Result<(), PublishError>;
}

/// reqwest-backed client
pub struct HttpModrinthClient {
    client: reqwest::Client,
    retry: RetryManager,
}

impl HttpModrinthClient {
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
}

impl Default for HttpModrinthClient {
    fn default() -> Self {
        Self::new()
    }
}

fn api_base(staging: bool) -> &'static str {
    if staging { STAGING_API_BASE } else { API_BASE }
}

#[async_trait]
impl ModrinthClient for HttpModrinthClient {
    async fn list_versions(
        &self,
        token: &SecretString,
        staging: bool,
        project_id: &str,
    ) -> Result<Vec<ModrinthVersionSummary>, PublishError> {
        let url = format!("{}/project/{project_id}/version", api_base(staging));
        let response = self
            .client
            .get(&url)
            .header("Authorization", token.expose_secret())
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Modrinth, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PublishError::TargetAuth {
                target: Target::Modrinth,
                message: format!("version list returned HTTP {status}"),
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PublishError::TargetNotFound {
                target: Target::Modrinth,
                message: format!("project {project_id} was not found"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::TargetUpload {
                target: Target::Modrinth,
                message: format!("version list returned HTTP {status}: {body}"),
            });
        }

        response
            .json::<Vec<ModrinthVersionSummary>>()
            .await
            .map_err(|e| PublishError::remote(Target::Modrinth, e))
    }

    async fn create_version(
        &self,
        token: &SecretString,
        staging: bool,
        data: &ModrinthVersionData,
        files: &[PathBuf],
    ) -> Result<String, PublishError> {
        let data_json = serde_json::to_string(data).map_err(|e| PublishError::TargetUpload {
            target: Target::Modrinth,
            message: format!("Cannot serialize version data: {e}"),
        })?;

        let mut file_bytes = Vec::with_capacity(files.len());
        for path in files {
            let bytes =
                tokio::fs::read(path)
                    .await
                    .map_err(|e| PublishError::ArtifactNotFound {
                        path: format!("{} ({e})", path.display()),
                    })?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string());
            file_bytes.push((name, bytes));
        }

        let url = format!("{}/version", api_base(staging));

        let response = self
            .retry
            .retry(|| async {
                let mut form =
                    reqwest::multipart::Form::new().text("data", data_json.clone());
                for (part_name, (file_name, bytes)) in
                    data.file_parts.iter().zip(file_bytes.iter())
                {
                    form = form.part(
                        part_name.clone(),
                        reqwest::multipart::Part::bytes(bytes.clone())
                            .file_name(file_name.clone()),
                    );
                }

                let response = self
                    .client
                    .post(&url)
                    .header("Authorization", token.expose_secret())
                    .multipart(form)
                    .send()
                    .await
                    .map_err(|e| PublishError::remote(Target::Modrinth, e))?;

                let status = response.status();
                if status == reqwest::StatusCode::UNAUTHORIZED {
                    return Err(PublishError::TargetAuth {
                        target: Target::Modrinth,
                        message: format!("version create returned HTTP {status}"),
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(PublishError::TargetNotFound {
                        target: Target::Modrinth,
                        message: format!("project {} was not found", data.project_id),
                    });
                }
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(PublishError::TargetUpload {
                        target: Target::Modrinth,
                        message: format!("version create returned HTTP {status}: {body}"),
                    });
                }

                response
                    .json::<VersionResponse>()
                    .await
                    .map_err(|e| PublishError::remote(Target::Modrinth, e))
            })
            .await?;

        Ok(response.id)
    }

    async fn update_version(
        &self,
        token: &SecretString,
        staging: bool,
        version_id: &str,
        patch: &ModrinthVersionPatch,
    ) -> Result<(), PublishError> {
        let url = format!("{}/version/{version_id}", api_base(staging));
        let response = self
            .client
            .patch(&url)
            .header("Authorization", token.expose_secret())
            .json(patch)
            .send()
            .await
            .map_err(|e| PublishError::remote(Target::Modrinth, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PublishError::TargetAuth {
                target: Target::Modrinth,
                message: format!("version update returned HTTP {status}"),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::TargetUpload {
                target: Target::Modrinth,
                message: format!("version update returned HTTP {status}: {body}"),
            });
        }

        Ok(())
    }
}

/// Drives the Modrinth publish workflow
pub struct ModrinthExecutor {
    client: Arc<dyn ModrinthClient>,
    resolver: ValueResolver,
}

impl ModrinthExecutor {
    pub fn new(client: Arc<dyn ModrinthClient>) -> Self {
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
            .for_target(Target::Modrinth)
            .ok_or_else(|| PublishError::TargetAuth {
                target: Target::Modrinth,
                message: "no API token configured".to_string(),
            })?;
        tracker.advance(PublishPhase::AuthChecked);

        // Every file goes out in the one version-create call
        let mut files = vec![artifact.to_path_buf()];
        for additional in &descriptor.additional_files {
            match self.resolver.resolve_file(&additional.artifact).await {
                Ok(path) => files.push(path),
                Err(e) => eprintln!("⚠️  [modrinth] skipping additional file: {e}"),
            }
        }
        tracker.advance(PublishPhase::ArtifactResolved);

        let changelog = self
            .resolver
            .resolve_text(&descriptor.changelog)
            .await?
            .unwrap_or_default();
        let data = build_version_data(descriptor, changelog, files.len())?;
        tracker.advance(PublishPhase::PayloadBuilt);

        if descriptor.flags.debug {
            let pretty = serde_json::to_string_pretty(&data)
                .map_err(|e| PublishError::remote(Target::Modrinth, e))?;
            println!("🐛 [modrinth] debug mode, payload:\n{pretty}");
            tracker.advance(PublishPhase::DebugShortCircuit);
            return Ok(TargetOutcome::DebugDryRun);
        }

        let staging = descriptor.flags.use_modrinth_staging;
        let existing = self
            .client
            .list_versions(token, staging, &data.project_id)
            .await?
            .into_iter()
            .find(|v| v.version_number == data.version_number);
        tracker.advance(PublishPhase::RemoteQueried);

        let version_id = match existing {
            Some(version) => {
                // Files cannot be replaced through the modify endpoint
                self.client
                    .update_version(token, staging, &version.id, &data.as_patch())
                    .await?;
                version.id
            }
            None => {
                self.client
                    .create_version(token, staging, &data, &files)
                    .await?
            }
        };
        tracker.advance_with_note(
            PublishPhase::Uploaded,
            Some(format!("version id {version_id}")),
        );
        tracker.advance(PublishPhase::Done);

        let url = format!(
            "https://modrinth.com/mod/{}/version/{version_id}",
            data.project_id
        );
        Ok(TargetOutcome::published(Some(url), Some(version_id)))
    }
}

#[async_trait]
impl PublishTarget for ModrinthExecutor {
    fn target(&self) -> Target {
        Target::Modrinth
    }

    async fn publish(
        &self,
        descriptor: &ReleaseDescriptor,
        artifact: &Path,
    ) -> Result<TargetOutcome, PublishError> {
        let mut tracker = PublishTracker::new(Target::Modrinth);
        match self.run(descriptor, artifact, &mut tracker).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracker.fail(e.to_string());
                eprintln!("[modrinth] workflow history:\n{}", tracker.history());
                Err(e)
            }
        }
    }
}
