//! Release configuration loading
//!
//! Reads the YAML release file, expands `${ENV_VAR}` references in the
//! credential block, and converts the raw schema into a validated
//! [`ReleaseDescriptor`].

use crate::core::config::ReleaseConfig;
use crate::core::descriptor::{
    AdditionalFile, ArtifactRef, ChangelogSource, Environment, GithubOptions, ReleaseChannel,
    ReleaseDescriptor, ReleaseFlags, clean_github_repo,
};
use crate::core::error::PublishError;
use crate::security::credentials::CredentialStore;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Default release file name
pub const CONFIG_FILENAME: &str = "publisher.yaml";

/// Fallback changelog when none is configured
const DEFAULT_CHANGELOG: &str = "No changelog provided";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read and parse the release file
    pub async fn load(path: &Path) -> Result<ReleaseConfig, PublishError> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            PublishError::configuration(format!(
                "Cannot read release file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            PublishError::configuration(format!(
                "Invalid release file {}: {e}",
                path.display()
            ))
        })
    }

    /// Convert the raw schema into a descriptor, resolving credentials
    /// against the given environment
    pub fn build_descriptor(
        config: ReleaseConfig,
        env: &HashMap<String, String>,
    ) -> Result<ReleaseDescriptor, PublishError> {
        let artifact = config
            .artifact
            .map(ArtifactRef::Path)
            .ok_or_else(|| PublishError::configuration("artifact is not defined"))?;

        let additional_files = config
            .additional_files
            .into_iter()
            .map(|file| AdditionalFile {
                artifact: ArtifactRef::Path(file.artifact),
                display_name: file.display_name,
                changelog: file.changelog.map(ChangelogSource::Text),
            })
            .collect();

        let changelog = match (config.changelog_file, config.changelog) {
            (Some(path), _) => ChangelogSource::File(path),
            (None, Some(text)) => ChangelogSource::Text(text),
            (None, None) => ChangelogSource::text(DEFAULT_CHANGELOG),
        };

        let channel = match config.version_type.as_deref() {
            Some(value) => ReleaseChannel::parse(value)?,
            None => ReleaseChannel::Release,
        };

        let environment = config
            .curse_environment
            .as_deref()
            .map(Environment::parse)
            .unwrap_or_default();

        let java_versions = config
            .java_versions
            .iter()
            .map(|v| parse_java_version(v))
            .collect::<Result<Vec<_>, _>>()?;

        let github = match config.github {
            Some(gh) => GithubOptions {
                repo: gh.repo.as_deref().map(clean_github_repo),
                tag: gh.tag,
                create_tag: gh.create_tag,
                create_release: gh.create_release,
                update_release: gh.update_release,
            },
            None => GithubOptions::default(),
        };

        let credentials = CredentialStore::resolve(&config.api_keys, env)?;

        Ok(ReleaseDescriptor {
            artifact,
            additional_files,
            version: config.version,
            display_name: config.display_name,
            changelog,
            channel,
            game_versions: config.game_versions,
            loaders: config.loaders,
            environment,
            java_versions,
            curse_depends: config.curse_depends,
            modrinth_depends: config.modrinth_depends,
            flags: ReleaseFlags {
                debug: config.debug,
                disable_malware_scanner: config.disable_malware_scanner,
                disable_jar_check: config.disable_jar_check,
                use_modrinth_staging: config.use_modrinth_staging,
            },
            credentials,
            curse_id: config.curse_id,
            modrinth_id: config.modrinth_id,
            github,
        })
    }
}

/// Accepts both "17" and "Java 17"
fn parse_java_version(value: &str) -> Result<u32, PublishError> {
    let digits = value
        .trim()
        .strip_prefix("Java ")
        .or_else(|| value.trim().strip_prefix("java "))
        .unwrap_or(value.trim());

    digits.parse::<u32>().map_err(|_| {
        PublishError::configuration(format!(
            "Invalid javaVersions entry '{value}'. Expected a major version such as 17 or \
             \"Java 17\""
        ))
    })
}
