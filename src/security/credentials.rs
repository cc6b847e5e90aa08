//! Secure credential handling
//!
//! API tokens come from the release file (with `${ENV_VAR}` expansion) or
//! from well-known environment variables as a fallback. They are wrapped in
//! `SecretString` the moment they are resolved, so nothing downstream can
//! print one by accident.

use crate::core::config::ApiKeysConfig;
use crate::core::descriptor::{ApiCredentials, Target};
use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::Regex;
use secrecy::SecretString;
use std::collections::HashMap;

/// Fallback environment variable per target
const TARGET_TOKENS: &[(Target, &str)] = &[
    (Target::Curseforge, "CURSEFORGE_TOKEN"),
    (Target::Modrinth, "MODRINTH_TOKEN"),
    (Target::Github, "GITHUB_TOKEN"),
];

lazy_static! {
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

pub struct CredentialStore;

impl CredentialStore {
    /// Resolve the credential block against the given environment
    ///
    /// A configured value referencing an unset variable resolves to no
    /// credential for that target, which in turn excludes the target from
    /// the run. Unexpanded placeholders mixed into a longer literal are an
    /// error, since that token would be sent to the remote API verbatim.
    pub fn resolve(
        config: &ApiKeysConfig,
        env: &HashMap<String, String>,
    ) -> Result<ApiCredentials, PublishError> {
        Ok(ApiCredentials {
            curseforge: Self::resolve_one(Target::Curseforge, config.curseforge.as_deref(), env)?,
            modrinth: Self::resolve_one(Target::Modrinth, config.modrinth.as_deref(), env)?,
            github: Self::resolve_one(Target::Github, config.github.as_deref(), env)?,
        })
    }

    fn resolve_one(
        target: Target,
        configured: Option<&str>,
        env: &HashMap<String, String>,
    ) -> Result<Option<SecretString>, PublishError> {
        let raw = match configured {
            Some(value) if !value.trim().is_empty() => value.trim(),
            _ => return Ok(Self::fallback(target, env)),
        };

        // A value that is exactly one placeholder may resolve to nothing
        if let Some(captures) = ENV_VAR_PATTERN.captures(raw) {
            let whole = captures.get(0).map(|m| m.as_str()).unwrap_or_default();
            if whole == raw {
                let name = &captures[1];
                return Ok(env
                    .get(name)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| SecretString::from(v.clone())));
            }

            return Err(PublishError::configuration(format!(
                "apiKeys.{target} mixes a ${{VAR}} reference with literal text. Use either a \
                 literal token or a single ${{VAR}} reference"
            )));
        }

        Ok(Some(SecretString::from(raw.to_string())))
    }

    fn fallback(target: Target, env: &HashMap<String, String>) -> Option<SecretString> {
        let (_, var_name) = TARGET_TOKENS.iter().find(|(t, _)| *t == target)?;

        env.get(*var_name)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()))
    }
}

/// Mask a token for log output, keeping just enough to identify it
pub fn mask_token(token: &str) -> String {
    if token.len() < 10 {
        return "****".to_string();
    }

    format!("{}...{}", &token[..3], &token[token.len() - 3..])
}
