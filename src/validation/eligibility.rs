//! Target eligibility resolution
//!
//! Publishing is opt-in per target: the presence of an API credential means
//! "publish here", and anything then missing from that target's configuration
//! is a hard error rather than a silent skip. A target with no credential is
//! excluded without comment.

use crate::core::descriptor::{ReleaseDescriptor, Target, is_modrinth_id};
use crate::core::error::PublishError;

/// Global preconditions, checked before any per-target rule
pub fn check_required_values(descriptor: &ReleaseDescriptor) -> Result<(), PublishError> {
    descriptor.validate()?;

    if !descriptor.credentials.any() {
        return Err(PublishError::configuration(
            "Missing apiKeys config. Artifacts cannot be uploaded without this",
        ));
    }

    if descriptor.game_versions.is_empty() {
        return Err(PublishError::configuration(
            "gameVersions is not defined. This is required",
        ));
    }

    Ok(())
}

/// Determine which targets are fully configured. Fails fast on partial
/// setups; silently excludes targets with no credential.
pub fn resolve(descriptor: &ReleaseDescriptor) -> Result<Vec<Target>, PublishError> {
    check_required_values(descriptor)?;

    let mut eligible = Vec::new();

    if can_publish_curseforge(descriptor)? {
        eligible.push(Target::Curseforge);
    }
    if can_publish_modrinth(descriptor)? {
        eligible.push(Target::Modrinth);
    }
    if can_publish_github(descriptor)? {
        eligible.push(Target::Github);
    }

    Ok(eligible)
}

fn can_publish_curseforge(descriptor: &ReleaseDescriptor) -> Result<bool, PublishError> {
    if !descriptor.credentials.has(Target::Curseforge) {
        return Ok(false);
    }

    if is_blank(descriptor.curse_id.as_deref()) {
        return Err(PublishError::eligibility(
            Target::Curseforge,
            "Found CurseForge API token, but curseId is not defined",
        ));
    }

    Ok(true)
}

fn can_publish_modrinth(descriptor: &ReleaseDescriptor) -> Result<bool, PublishError> {
    if !descriptor.credentials.has(Target::Modrinth) {
        return Ok(false);
    }

    if is_blank(descriptor.version.as_deref()) {
        return Err(PublishError::eligibility(
            Target::Modrinth,
            "Version is not defined. This is required by Modrinth",
        ));
    }

    let Some(project_id) = descriptor.modrinth_id.as_deref().filter(|v| !v.trim().is_empty())
    else {
        return Err(PublishError::eligibility(
            Target::Modrinth,
            "Found Modrinth API token, but modrinthId is not defined",
        ));
    };

    if !is_modrinth_id(project_id) {
        // Slugs still work against the API, but IDs are the documented input
        eprintln!("⚠️  modrinthId '{project_id}' does not look like a project ID (expected alphanumeric)");
    }

    Ok(true)
}

fn can_publish_github(descriptor: &ReleaseDescriptor) -> Result<bool, PublishError> {
    if !descriptor.credentials.has(Target::Github) {
        return Ok(false);
    }

    if descriptor
        .github
        .effective_tag(descriptor.version.as_deref())
        .is_none()
    {
        return Err(PublishError::eligibility(
            Target::Github,
            "Neither version nor GitHub tag are defined. At least one is required by GitHub",
        ));
    }

    if !descriptor.github.create_release && !descriptor.github.update_release {
        return Err(PublishError::eligibility(
            Target::Github,
            "GitHub options createRelease and updateRelease are both disabled, at least one \
             must be enabled",
        ));
    }

    if is_blank(descriptor.github.repo.as_deref()) {
        return Err(PublishError::eligibility(
            Target::Github,
            "Found GitHub token, but github repo is not defined",
        ));
    }

    Ok(true)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{
        ApiCredentials, ArtifactRef, ChangelogSource, DependencySet, Environment, GithubOptions,
        ReleaseChannel, ReleaseDescriptor, ReleaseFlags,
    };
    use secrecy::SecretString;

    fn base_descriptor() -> ReleaseDescriptor {
        ReleaseDescriptor {
            artifact: ArtifactRef::path("mod.jar"),
            additional_files: Vec::new(),
            version: Some("1.0.0".to_string()),
            display_name: None,
            changelog: ChangelogSource::text("changes"),
            channel: ReleaseChannel::Release,
            game_versions: vec!["1.20".to_string()],
            loaders: vec!["fabric".to_string()],
            environment: Environment::Both,
            java_versions: Vec::new(),
            curse_depends: DependencySet::default(),
            modrinth_depends: DependencySet::default(),
            flags: ReleaseFlags::default(),
            credentials: ApiCredentials::default(),
            curse_id: None,
            modrinth_id: None,
            github: GithubOptions::default(),
        }
    }

    fn token() -> SecretString {
        SecretString::from("test-token")
    }

    #[test]
    fn test_no_credentials_is_a_configuration_error() {
        let descriptor = base_descriptor();
        let err = resolve(&descriptor).unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_empty_game_versions_rejected() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.modrinth = Some(token());
        descriptor.modrinth_id = Some("AABBCCDD".to_string());
        descriptor.game_versions.clear();

        let err = resolve(&descriptor).unwrap_err();
        assert!(err.to_string().contains("gameVersions"));
    }

    #[test]
    fn test_credential_without_identifier_raises() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.curseforge = Some(token());

        let err = resolve(&descriptor).unwrap_err();
        assert_eq!(err.target(), Some(Target::Curseforge));
        assert!(err.to_string().contains("curseId"));
    }

    #[test]
    fn test_missing_credential_silently_excludes() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.modrinth = Some(token());
        descriptor.modrinth_id = Some("AABBCCDD".to_string());

        let eligible = resolve(&descriptor).unwrap();
        assert_eq!(eligible, vec![Target::Modrinth]);
    }

    #[test]
    fn test_modrinth_requires_version() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.modrinth = Some(token());
        descriptor.modrinth_id = Some("AABBCCDD".to_string());
        descriptor.version = None;

        let err = resolve(&descriptor).unwrap_err();
        assert_eq!(err.target(), Some(Target::Modrinth));
        assert!(err.to_string().contains("Version is not defined"));
    }

    #[test]
    fn test_github_requires_version_or_tag() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.github = Some(token());
        descriptor.github.repo = Some("owner/repo".to_string());
        descriptor.version = None;

        let err = resolve(&descriptor).unwrap_err();
        assert_eq!(err.target(), Some(Target::Github));

        descriptor.github.tag = Some("v1.0.0".to_string());
        assert_eq!(resolve(&descriptor).unwrap(), vec![Target::Github]);
    }

    #[test]
    fn test_github_both_policies_disabled_raises() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.github = Some(token());
        descriptor.github.repo = Some("owner/repo".to_string());
        descriptor.github.create_release = false;
        descriptor.github.update_release = false;

        let err = resolve(&descriptor).unwrap_err();
        assert!(err.to_string().contains("createRelease"));
    }

    #[test]
    fn test_github_requires_repo() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.github = Some(token());

        let err = resolve(&descriptor).unwrap_err();
        assert!(err.to_string().contains("github repo is not defined"));
    }

    #[test]
    fn test_all_targets_eligible() {
        let mut descriptor = base_descriptor();
        descriptor.credentials.curseforge = Some(token());
        descriptor.credentials.modrinth = Some(token());
        descriptor.credentials.github = Some(token());
        descriptor.curse_id = Some("123456".to_string());
        descriptor.modrinth_id = Some("AABBCCDD".to_string());
        descriptor.github.repo = Some("owner/repo".to_string());

        let eligible = resolve(&descriptor).unwrap();
        assert_eq!(
            eligible,
            vec![Target::Curseforge, Target::Modrinth, Target::Github]
        );
    }
}
