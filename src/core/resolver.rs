//! Lazy resolution of indirect changelog and artifact references
//!
//! Changelog content is best-effort: a remote fetch that fails, or a URL that
//! is not on the allow-list, resolves to nothing rather than failing the
//! publish. Artifact resolution is strict; a missing file is always an error.

use crate::core::descriptor::{ArtifactRef, ChangelogSource};
use crate::core::error::PublishError;
use std::path::PathBuf;
use std::time::Duration;

/// Hosts changelog URLs may be fetched from. Anything else is rejected
/// without a network call.
pub const ALLOWED_CHANGELOG_HOSTS: &[&str] = &[
    "https://gist.githubusercontent.com",
    "https://raw.githubusercontent.com",
    "https://paste.firstdark.dev/raw",
];

/// Provider chains longer than this are assumed to be cyclic
const MAX_PROVIDER_DEPTH: usize = 16;

/// Check a changelog URL against the allow-list
pub fn is_allowed_changelog_url(url: &str) -> bool {
    ALLOWED_CHANGELOG_HOSTS
        .iter()
        .any(|host| url.starts_with(host))
}

/// Resolver for [`ChangelogSource`] and [`ArtifactRef`] values
pub struct ValueResolver {
    client: reqwest::Client,
}

impl Default for ValueResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueResolver {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("mod-publisher/0.1")
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Resolve a changelog source to text. Returns `Ok(None)` when the
    /// content is unavailable for a non-fatal reason (rejected URL, failed
    /// fetch, empty response body).
    pub async fn resolve_text(
        &self,
        source: &ChangelogSource,
    ) -> Result<Option<String>, PublishError> {
        let mut current = source.clone();

        for _ in 0..MAX_PROVIDER_DEPTH {
            match current {
                ChangelogSource::Provider(provider) => {
                    current = provider();
                }
                ChangelogSource::Text(value) => {
                    if value.starts_with("http://") || value.starts_with("https://") {
                        return self.read_from_url(&value).await;
                    }
                    return Ok(Some(value));
                }
                ChangelogSource::Url(url) => {
                    return self.read_from_url(&url).await;
                }
                ChangelogSource::File(path) => {
                    let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
                        PublishError::configuration(format!(
                            "Cannot read changelog file {}: {e}",
                            path.display()
                        ))
                    })?;
                    return Ok(Some(text));
                }
            }
        }

        Err(PublishError::configuration(format!(
            "Changelog provider chain exceeded {MAX_PROVIDER_DEPTH} levels of indirection"
        )))
    }

    /// Resolve an artifact reference to an existing file path
    pub async fn resolve_file(&self, artifact: &ArtifactRef) -> Result<PathBuf, PublishError> {
        let path = match artifact {
            ArtifactRef::Path(path) => path.clone(),
            ArtifactRef::BuildOutput(provider) => provider(),
        };

        if tokio::fs::metadata(&path).await.is_err() {
            return Err(PublishError::ArtifactNotFound {
                path: path.display().to_string(),
            });
        }

        Ok(path)
    }

    async fn read_from_url(&self, url: &str) -> Result<Option<String>, PublishError> {
        if !is_allowed_changelog_url(url) {
            eprintln!("⚠️  {url} is an unsupported changelog site, ignoring");
            return Ok(None);
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("⚠️  Failed to fetch changelog from {url}: {e}");
                return Ok(None);
            }
        };

        if !response.status().is_success() {
            eprintln!(
                "⚠️  Changelog fetch from {url} returned HTTP {}",
                response.status()
            );
            return Ok(None);
        }

        match response.text().await {
            Ok(body) if !body.is_empty() => Ok(Some(body)),
            Ok(_) => Ok(None),
            Err(e) => {
                eprintln!("⚠️  Failed to read changelog body from {url}: {e}");
                Ok(None)
            }
        }
    }
}
