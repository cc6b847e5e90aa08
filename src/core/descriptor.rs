//! Release data model
//!
//! A [`ReleaseDescriptor`] is the normalized in-memory representation of one
//! mod release. It is built once per invocation from configuration, validated,
//! and treated as read-only from that point on. All per-target payloads are
//! derived views over this one structure.

use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

lazy_static! {
    static ref MODRINTH_ID_PATTERN: Regex = Regex::new("^[0-9a-zA-Z]+$").unwrap();
}

/// Remote publishing destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Curseforge,
    Modrinth,
    Github,
}

impl Target {
    /// All targets, in the order they are attempted
    pub fn all() -> [Target; 3] {
        [Target::Curseforge, Target::Modrinth, Target::Github]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Curseforge => "curseforge",
            Target::Modrinth => "modrinth",
            Target::Github => "github",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of release. Maps onto CurseForge release types, Modrinth version
/// types and the GitHub prerelease flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    #[default]
    Release,
    Beta,
    Alpha,
}

impl ReleaseChannel {
    /// Case-insensitive parse; anything unrecognized is a configuration error
    pub fn parse(value: &str) -> Result<Self, PublishError> {
        match value.to_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "beta" => Ok(Self::Beta),
            "alpha" => Ok(Self::Alpha),
            other => Err(PublishError::configuration(format!(
                "Invalid versionType '{other}'. Valid entries: release, beta, alpha"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
        }
    }

    /// Beta and alpha releases are marked as prereleases on GitHub
    pub fn is_prerelease(&self) -> bool {
        matches!(self, Self::Beta | Self::Alpha)
    }
}

/// Side the mod runs on, expanded into synthetic CurseForge version tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Client,
    Server,
    #[default]
    Both,
}

impl Environment {
    /// Case-insensitive parse. Unrecognized values fall back to both, which
    /// matches how the environment tag has historically been treated.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "client" => Self::Client,
            "server" => Self::Server,
            _ => Self::Both,
        }
    }
}

/// Reference to the file that will be uploaded
#[derive(Clone)]
pub enum ArtifactRef {
    /// Literal filesystem path
    Path(PathBuf),
    /// Lazily produced build output. The provider is only invoked when the
    /// artifact is actually needed.
    BuildOutput(Arc<dyn Fn() -> PathBuf + Send + Sync>),
}

impl ArtifactRef {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }
}

impl fmt::Debug for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::BuildOutput(_) => f.write_str("BuildOutput(..)"),
        }
    }
}

/// Indirect changelog value, resolved lazily at the point of need
#[derive(Clone)]
pub enum ChangelogSource {
    /// Literal text. A literal beginning with http:// or https:// is treated
    /// as a URL when resolved.
    Text(String),
    /// Local file read as UTF-8
    File(PathBuf),
    /// Remote URL, only fetched when its origin is allow-listed
    Url(String),
    /// Zero-argument provider returning another changelog source. Chains are
    /// bounded by the resolver.
    Provider(Arc<dyn Fn() -> ChangelogSource + Send + Sync>),
}

impl ChangelogSource {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl fmt::Debug for ChangelogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

/// Secondary artifact uploaded along with the main one
#[derive(Debug, Clone)]
pub struct AdditionalFile {
    pub artifact: ArtifactRef,
    pub display_name: Option<String>,
    pub changelog: Option<ChangelogSource>,
}

/// The four dependency relation kinds shared by CurseForge and Modrinth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Required,
    Optional,
    Incompatible,
    Embedded,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Incompatible => "incompatible",
            Self::Embedded => "embedded",
        }
    }
}

/// Target-scoped dependency identifiers, one list per relation kind.
/// Identifiers are opaque; no cross-target translation is attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencySet {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub incompatible: Vec<String>,
    pub embedded: Vec<String>,
}

impl DependencySet {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
            && self.optional.is_empty()
            && self.incompatible.is_empty()
            && self.embedded.is_empty()
    }
}

/// Behavior switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseFlags {
    /// Build and report payloads without performing any remote mutation
    pub debug: bool,
    /// Skip the content scanner collaborator
    pub disable_malware_scanner: bool,
    /// Skip the archive manifest check
    pub disable_jar_check: bool,
    /// Publish against the Modrinth staging API
    pub use_modrinth_staging: bool,
}

/// GitHub release options and mutation policy guards
#[derive(Debug, Clone)]
pub struct GithubOptions {
    /// username/repo or a full repository URL
    pub repo: Option<String>,
    /// Release tag. Defaults to the release version.
    pub tag: Option<String>,
    /// Create the tag if missing
    pub create_tag: bool,
    /// Create the release if missing
    pub create_release: bool,
    /// Update the release if it exists
    pub update_release: bool,
}

impl Default for GithubOptions {
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

impl GithubOptions {
    /// Natural key used to look up an existing release
    pub fn effective_tag<'a>(&'a self, version: Option<&'a str>) -> Option<&'a str> {
        self.tag
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(version)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Strip URL decoration from a GitHub repository reference, leaving the
/// owner/repo slug
pub fn clean_github_repo(url: &str) -> String {
    let mut repo = url
        .replace("https://github.com/", "")
        .replace("http://github.com/", "")
        .replace("git@github.com:", "")
        .replace(".git", "");

    if repo.ends_with('/') {
        repo.pop();
    }

    repo
}

/// Modrinth project IDs are plain alphanumeric strings (not slugs)
pub fn is_modrinth_id(value: &str) -> bool {
    MODRINTH_ID_PATTERN.is_match(value)
}

/// Per-target API credentials. Presence of a credential is the opt-in signal
/// for that target.
#[derive(Clone, Default)]
pub struct ApiCredentials {
    pub curseforge: Option<SecretString>,
    pub modrinth: Option<SecretString>,
    pub github: Option<SecretString>,
}

impl ApiCredentials {
    pub fn for_target(&self, target: Target) -> Option<&SecretString> {
        match target {
            Target::Curseforge => self.curseforge.as_ref(),
            Target::Modrinth => self.modrinth.as_ref(),
            Target::Github => self.github.as_ref(),
        }
    }

    pub fn has(&self, target: Target) -> bool {
        self.for_target(target).is_some()
    }

    pub fn any(&self) -> bool {
        Target::all().iter().any(|t| self.has(*t))
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("curseforge", &self.curseforge.is_some())
            .field("modrinth", &self.modrinth.is_some())
            .field("github", &self.github.is_some())
            .finish()
    }
}

/// Normalized description of one release, shared read-only by all targets
#[derive(Debug, Clone)]
pub struct ReleaseDescriptor {
    pub artifact: ArtifactRef,
    pub additional_files: Vec<AdditionalFile>,
    pub version: Option<String>,
    pub display_name: Option<String>,
    pub changelog: ChangelogSource,
    pub channel: ReleaseChannel,
    pub game_versions: Vec<String>,
    pub loaders: Vec<String>,
    pub environment: Environment,
    pub java_versions: Vec<u32>,
    pub curse_depends: DependencySet,
    pub modrinth_depends: DependencySet,
    pub flags: ReleaseFlags,
    pub credentials: ApiCredentials,
    pub curse_id: Option<String>,
    pub modrinth_id: Option<String>,
    pub github: GithubOptions,
}

impl ReleaseDescriptor {
    /// Display name with the version fallback
    pub fn effective_display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.version.as_deref())
            .filter(|v| !v.trim().is_empty())
    }

    /// Structural validation, run once after construction and before any
    /// target is attempted
    pub fn validate(&self) -> Result<(), PublishError> {
        let mut seen = std::collections::HashSet::new();
        for version in &self.game_versions {
            if !seen.insert(version.as_str()) {
                return Err(PublishError::configuration(format!(
                    "Duplicate game version '{version}' in gameVersions"
                )));
            }
        }

        Ok(())
    }
}
