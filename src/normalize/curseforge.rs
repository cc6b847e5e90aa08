//! CurseForge metadata normalization
//!
//! CurseForge has the quirkiest version vocabulary of the three targets. Its
//! site only lists legacy beta versions down to `beta 1.6.6`, writes them
//! with a spelled-out `beta ` prefix, and models client/server support as
//! extra pseudo-versions alongside the real game versions.

use crate::core::descriptor::{DependencyKind, Environment, ReleaseDescriptor};
use crate::normalize::dependency_records;
use crate::validation::version_compare;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;

/// Oldest legacy beta CurseForge accepts, and the slug it is filed under
const LEGACY_FLOOR: &str = "b1.6.6";
const LEGACY_FLOOR_SLUG: &str = "beta 1.6.6";

lazy_static! {
    // Snapshot-style identifiers such as 23w17a are listed verbatim
    static ref PLAIN_ALPHANUMERIC: Regex = Regex::new(r"^[a-zA-Z0-9]+$").unwrap();
}

/// Relation record for the upload metadata `relations.projects` array
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CurseRelation {
    pub slug: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

/// Map one declared game version onto CurseForge's vocabulary
pub fn normalize_game_version(version: &str) -> String {
    if PLAIN_ALPHANUMERIC.is_match(version) {
        return version.to_string();
    }

    if version.contains("-pre") || version.contains("-rc") {
        return version.to_string();
    }

    if version_compare::compare(version, LEGACY_FLOOR) == Ordering::Less {
        return LEGACY_FLOOR_SLUG.to_string();
    }

    match version.strip_prefix('b') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => {
            format!("beta {rest}")
        }
        _ => version.to_string(),
    }
}

/// Full game version list for the upload payload. Real versions come first,
/// then the environment pseudo-versions, then `Java N` entries.
pub fn game_versions(descriptor: &ReleaseDescriptor) -> Vec<String> {
    let mut versions = Vec::new();

    for declared in &descriptor.game_versions {
        let mapped = normalize_game_version(declared);
        // Everything below the floor collapses onto one slug
        if !versions.contains(&mapped) {
            versions.push(mapped);
        }
    }

    for tag in environment_tags(descriptor.environment) {
        versions.push(tag.to_string());
    }

    for java in &descriptor.java_versions {
        versions.push(format!("Java {java}"));
    }

    versions
}

fn environment_tags(environment: Environment) -> &'static [&'static str] {
    match environment {
        Environment::Client => &["client"],
        Environment::Server => &["server"],
        Environment::Both => &["client", "server"],
    }
}

/// Loader names in CurseForge's vocabulary
pub fn loaders(declared: &[String]) -> Vec<String> {
    declared
        .iter()
        .map(|loader| {
            if loader.eq_ignore_ascii_case("modloader") {
                "risugami's modloader".to_string()
            } else {
                loader.clone()
            }
        })
        .collect()
}

/// Dependency relations for the upload metadata
pub fn relations(descriptor: &ReleaseDescriptor) -> Vec<CurseRelation> {
    dependency_records(&descriptor.curse_depends)
        .into_iter()
        .map(|(slug, kind)| CurseRelation {
            slug,
            relation_type: relation_type(kind).to_string(),
        })
        .collect()
}

fn relation_type(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::Required => "requiredDependency",
        DependencyKind::Optional => "optionalDependency",
        DependencyKind::Incompatible => "incompatible",
        DependencyKind::Embedded => "embeddedLibrary",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{
        ApiCredentials, ArtifactRef, ChangelogSource, DependencySet, GithubOptions,
        ReleaseChannel, ReleaseFlags,
    };

    fn descriptor_with(game_versions: &[&str], environment: Environment) -> ReleaseDescriptor {
        ReleaseDescriptor {
            artifact: ArtifactRef::path("mod.jar"),
            additional_files: Vec::new(),
            version: Some("1.0.0".to_string()),
            display_name: None,
            changelog: ChangelogSource::text("changes"),
            channel: ReleaseChannel::Release,
            game_versions: game_versions.iter().map(|s| s.to_string()).collect(),
            loaders: Vec::new(),
            environment,
            java_versions: Vec::new(),
            curse_depends: DependencySet::default(),
            modrinth_depends: DependencySet::default(),
            flags: ReleaseFlags::default(),
            credentials: ApiCredentials::default(),
            curse_id: Some("123456".to_string()),
            modrinth_id: None,
            github: GithubOptions::default(),
        }
    }

    #[test]
    fn test_snapshot_identifiers_pass_through() {
        assert_eq!(normalize_game_version("23w17a"), "23w17a");
    }

    #[test]
    fn test_pre_and_rc_identifiers_pass_through() {
        assert_eq!(normalize_game_version("1.20-pre1"), "1.20-pre1");
        assert_eq!(normalize_game_version("1.20-rc2"), "1.20-rc2");
    }

    #[test]
    fn test_versions_below_floor_collapse() {
        assert_eq!(normalize_game_version("b1.5.0"), "beta 1.6.6");
        assert_eq!(normalize_game_version("a1.0.4"), "beta 1.6.6");
        assert_eq!(normalize_game_version("rd-132211"), "beta 1.6.6");
    }

    #[test]
    fn test_releases_above_the_beta_floor_pass_through() {
        // Early numbered releases postdate beta 1.6.6 and must not collapse
        assert_eq!(normalize_game_version("1.0"), "1.0");
        assert_eq!(normalize_game_version("1.5.2"), "1.5.2");
        assert_eq!(normalize_game_version("1.6.4"), "1.6.4");
    }

    #[test]
    fn test_legacy_beta_rewritten_with_prefix() {
        assert_eq!(normalize_game_version("b1.6.6"), "beta 1.6.6");
        assert_eq!(normalize_game_version("b1.7.3"), "beta 1.7.3");
    }

    #[test]
    fn test_modern_versions_unchanged() {
        assert_eq!(normalize_game_version("1.20.1"), "1.20.1");
    }

    #[test]
    fn test_collapsed_versions_deduplicated() {
        let descriptor = descriptor_with(&["b1.5.0", "a1.0.4"], Environment::Client);
        assert_eq!(game_versions(&descriptor), vec!["beta 1.6.6", "client"]);
    }

    #[test]
    fn test_environment_both_appends_two_tags() {
        let descriptor = descriptor_with(&["1.20"], Environment::Both);
        assert_eq!(game_versions(&descriptor), vec!["1.20", "client", "server"]);
    }

    #[test]
    fn test_java_versions_appended_with_prefix() {
        let mut descriptor = descriptor_with(&["1.20"], Environment::Server);
        descriptor.java_versions = vec![17, 21];

        assert_eq!(
            game_versions(&descriptor),
            vec!["1.20", "server", "Java 17", "Java 21"]
        );
    }

    #[test]
    fn test_modloader_renamed() {
        let declared = vec!["Forge".to_string(), "modloader".to_string()];
        assert_eq!(loaders(&declared), vec!["Forge", "risugami's modloader"]);
    }

    #[test]
    fn test_relations_use_curse_relation_types() {
        let mut descriptor = descriptor_with(&["1.20"], Environment::Both);
        descriptor.curse_depends = DependencySet {
            required: vec!["fabric-api".to_string()],
            optional: Vec::new(),
            incompatible: vec!["optifine".to_string()],
            embedded: Vec::new(),
        };

        assert_eq!(
            relations(&descriptor),
            vec![
                CurseRelation {
                    slug: "fabric-api".to_string(),
                    relation_type: "requiredDependency".to_string(),
                },
                CurseRelation {
                    slug: "optifine".to_string(),
                    relation_type: "incompatible".to_string(),
                },
            ]
        );
    }
}
