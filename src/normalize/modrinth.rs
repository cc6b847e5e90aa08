//! Modrinth metadata normalization
//!
//! Modrinth keeps game versions close to the launcher's own identifiers, so
//! there is much less rewriting here than for CurseForge. The one exclusion
//! is `-snapshot` suffixed identifiers, which its version index never lists.

use crate::core::descriptor::{DependencyKind, ReleaseDescriptor};
use crate::normalize::dependency_records;
use serde::Serialize;

/// Dependency record for the version-create payload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ModrinthDependency {
    pub project_id: String,
    pub dependency_type: String,
}

/// Game versions Modrinth will accept. Identifiers ending in `-snapshot`
/// are dropped rather than rejected, so a multi-version release still goes
/// out with its remaining versions.
pub fn game_versions(descriptor: &ReleaseDescriptor) -> Vec<String> {
    descriptor
        .game_versions
        .iter()
        .filter(|v| !v.ends_with("-snapshot"))
        .cloned()
        .collect()
}

/// Loader names in Modrinth's vocabulary, de-duplicated in declared order
pub fn loaders(declared: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for loader in declared {
        let mapped = if loader.eq_ignore_ascii_case("risugami's modloader") {
            "modloader".to_string()
        } else {
            loader.clone()
        };
        if !result.contains(&mapped) {
            result.push(mapped);
        }
    }

    result
}

/// Dependency records, or `None` when there are none so the payload field
/// can be omitted entirely
pub fn dependencies(descriptor: &ReleaseDescriptor) -> Option<Vec<ModrinthDependency>> {
    let records = dependency_records(&descriptor.modrinth_depends);
    if records.is_empty() {
        return None;
    }

    Some(
        records
            .into_iter()
            .map(|(project_id, kind)| ModrinthDependency {
                project_id,
                dependency_type: dependency_type(kind).to_string(),
            })
            .collect(),
    )
}

fn dependency_type(kind: DependencyKind) -> &'static str {
    match kind {
        DependencyKind::Required => "required",
        DependencyKind::Optional => "optional",
        DependencyKind::Incompatible => "incompatible",
        DependencyKind::Embedded => "embedded",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{
        ApiCredentials, ArtifactRef, ChangelogSource, DependencySet, Environment, GithubOptions,
        ReleaseChannel, ReleaseFlags,
    };

    fn descriptor_with(game_versions: &[&str]) -> ReleaseDescriptor {
        ReleaseDescriptor {
            artifact: ArtifactRef::path("mod.jar"),
            additional_files: Vec::new(),
            version: Some("1.0.0".to_string()),
            display_name: None,
            changelog: ChangelogSource::text("changes"),
            channel: ReleaseChannel::Release,
            game_versions: game_versions.iter().map(|s| s.to_string()).collect(),
            loaders: Vec::new(),
            environment: Environment::Both,
            java_versions: Vec::new(),
            curse_depends: DependencySet::default(),
            modrinth_depends: DependencySet::default(),
            flags: ReleaseFlags::default(),
            credentials: ApiCredentials::default(),
            curse_id: None,
            modrinth_id: Some("AABBCCDD".to_string()),
            github: GithubOptions::default(),
        }
    }

    #[test]
    fn test_snapshot_suffix_dropped() {
        let descriptor = descriptor_with(&["1.20", "23w17a-snapshot", "1.20.1"]);
        assert_eq!(game_versions(&descriptor), vec!["1.20", "1.20.1"]);
    }

    #[test]
    fn test_plain_versions_unchanged() {
        let descriptor = descriptor_with(&["1.20", "23w17a"]);
        assert_eq!(game_versions(&descriptor), vec!["1.20", "23w17a"]);
    }

    #[test]
    fn test_modloader_renamed_back_and_deduplicated() {
        let declared = vec![
            "risugami's modloader".to_string(),
            "modloader".to_string(),
            "fabric".to_string(),
        ];
        assert_eq!(loaders(&declared), vec!["modloader", "fabric"]);
    }

    #[test]
    fn test_empty_dependency_set_omitted() {
        let descriptor = descriptor_with(&["1.20"]);
        assert_eq!(dependencies(&descriptor), None);
    }

    #[test]
    fn test_dependencies_use_modrinth_types() {
        let mut descriptor = descriptor_with(&["1.20"]);
        descriptor.modrinth_depends = DependencySet {
            required: vec!["P7dR8mSH".to_string()],
            optional: Vec::new(),
            incompatible: Vec::new(),
            embedded: vec!["9s6osm5g".to_string()],
        };

        assert_eq!(
            dependencies(&descriptor),
            Some(vec![
                ModrinthDependency {
                    project_id: "P7dR8mSH".to_string(),
                    dependency_type: "required".to_string(),
                },
                ModrinthDependency {
                    project_id: "9s6osm5g".to_string(),
                    dependency_type: "embedded".to_string(),
                },
            ])
        );
    }
}
