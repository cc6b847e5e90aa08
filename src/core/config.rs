//! Release configuration schema
//!
//! The on-disk YAML uses camelCase keys. These structs are the raw parse
//! layer only; credential expansion and conversion into a
//! [`crate::core::descriptor::ReleaseDescriptor`] live in the loader.

use crate::core::descriptor::DependencySet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root release configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ReleaseConfig {
    /// Path to the primary artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,

    /// Secondary artifacts uploaded after the primary one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_files: Vec<AdditionalFileConfig>,

    /// Release version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Human-readable release name (defaults to the version)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Changelog text or URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,

    /// Changelog read from a local file. Takes precedence over `changelog`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_file: Option<PathBuf>,

    /// Release channel: release, beta or alpha (default: release)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_type: Option<String>,

    /// Supported game versions (required)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub game_versions: Vec<String>,

    /// Declared mod loaders (recommended)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loaders: Vec<String>,

    /// Side the mod runs on: client, server or both (default: both)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curse_environment: Option<String>,

    /// Supported Java major versions, with or without a "Java " prefix
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub java_versions: Vec<String>,

    /// CurseForge project dependencies, keyed by slug
    #[serde(skip_serializing_if = "DependencySet::is_empty")]
    pub curse_depends: DependencySet,

    /// Modrinth project dependencies, keyed by project ID
    #[serde(skip_serializing_if = "DependencySet::is_empty")]
    pub modrinth_depends: DependencySet,

    /// Content scanner command run on the artifact before any upload. The
    /// artifact path is appended as the last argument.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scanner_command: Vec<String>,

    /// Print payloads instead of uploading
    pub debug: bool,

    /// Skip the pre-upload content scan
    pub disable_malware_scanner: bool,

    /// Skip the loader manifest check on the artifact
    pub disable_jar_check: bool,

    /// Publish against the Modrinth staging API
    pub use_modrinth_staging: bool,

    /// API credentials, with `${ENV_VAR}` expansion
    pub api_keys: ApiKeysConfig,

    /// CurseForge project ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curse_id: Option<String>,

    /// Modrinth project ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modrinth_id: Option<String>,

    /// GitHub release options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubConfig>,
}

/// One secondary artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdditionalFileConfig {
    pub artifact: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
}

/// Raw credential values as written in the config file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiKeysConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curseforge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modrinth: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

/// GitHub block of the release configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct GithubConfig {
    /// owner/repo slug or full repository URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Release tag (defaults to the version)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Create the tag if it does not exist (default: true)
    pub create_tag: bool,

    /// Create the release if it does not exist (default: true)
    pub create_release: bool,

    /// Update the release if it already exists (default: true)
    pub update_release: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repo: None,
            tag: None,
            create_tag: true,
            create_release: true,
            update_release: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let yaml = r#"
artifact: build/libs/mod-1.0.jar
version: "1.0.0"
gameVersions:
  - "1.20"
  - "1.20.1"
apiKeys:
  modrinth: ${MODRINTH_TOKEN}
modrinthId: AABBCCDD
"#;
        let config: ReleaseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.version.as_deref(), Some("1.0.0"));
        assert_eq!(config.game_versions.len(), 2);
        assert_eq!(
            config.api_keys.modrinth.as_deref(),
            Some("${MODRINTH_TOKEN}")
        );
        assert!(!config.debug);
        assert!(config.github.is_none());
    }

    #[test]
    fn test_github_policy_defaults_are_permissive() {
        let yaml = r#"
repo: owner/repo
"#;
        let config: GithubConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(config.create_tag);
        assert!(config.create_release);
        assert!(config.update_release);
    }

    #[test]
    fn test_github_policies_can_be_disabled() {
        let yaml = r#"
repo: owner/repo
createRelease: false
updateRelease: false
"#;
        let config: GithubConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(!config.create_release);
        assert!(!config.update_release);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let yaml = r#"
version: "1.0.0"
gameVersion: "1.20"
"#;
        let result: Result<ReleaseConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_scanner_command_parses() {
        let yaml = r#"
gameVersions: ["1.20"]
scannerCommand: ["clamscan", "--no-summary"]
"#;
        let config: ReleaseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.scanner_command, vec!["clamscan", "--no-summary"]);
    }

    #[test]
    fn test_dependency_sets_parse() {
        let yaml = r#"
gameVersions: ["1.20"]
curseDepends:
  required: ["fabric-api"]
modrinthDepends:
  optional: ["P7dR8mSH"]
"#;
        let config: ReleaseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.curse_depends.required, vec!["fabric-api"]);
        assert_eq!(config.modrinth_depends.optional, vec!["P7dR8mSH"]);
        assert!(config.curse_depends.optional.is_empty());
    }

    #[test]
    fn test_additional_files_parse() {
        let yaml = r#"
gameVersions: ["1.20"]
additionalFiles:
  - artifact: build/libs/mod-sources.jar
    displayName: Sources
"#;
        let config: ReleaseConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.additional_files.len(), 1);
        assert_eq!(
            config.additional_files[0].display_name.as_deref(),
            Some("Sources")
        );
        assert!(config.additional_files[0].changelog.is_none());
    }

    #[test]
    fn test_round_trip() {
        let mut config = ReleaseConfig::default();
        config.version = Some("2.1.0".to_string());
        config.game_versions = vec!["1.20".to_string()];
        config.debug = true;

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ReleaseConfig = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed, config);
    }
}
