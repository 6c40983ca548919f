use crate::error::SessionError;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_LANGUAGE: &str = "en";

/// User-configurable sync parameters, as persisted by the helper.
///
/// Field names on the wire follow the helper's vocabulary (`token`, `url`,
/// `container`, `directory`, `exclude`). Unknown keys in a response (the
/// echoed `action`, for one) are ignored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "token", default)]
    pub credential_token: Option<String>,

    #[serde(rename = "url", default)]
    pub remote_url: Option<String>,

    #[serde(rename = "container", default)]
    pub remote_container: Option<String>,

    #[serde(rename = "directory", default)]
    pub local_directory: Option<String>,

    #[serde(rename = "exclude", default, deserialize_with = "exclude_patterns")]
    pub exclude_patterns: BTreeSet<String>,

    #[serde(default = "default_language", deserialize_with = "language_or_default")]
    pub language: String,

    #[serde(default = "default_sync_on_start")]
    pub sync_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credential_token: None,
            remote_url: None,
            remote_container: None,
            local_directory: None,
            exclude_patterns: BTreeSet::new(),
            language: default_language(),
            sync_on_start: default_sync_on_start(),
        }
    }
}

impl Settings {
    /// Check a candidate before it is written to the helper.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidSettings`] when a non-empty remote URL
    /// is not an absolute URL.
    pub fn validate(&self) -> Result<(), SessionError> {
        if let Some(ref remote_url) = self.remote_url {
            if !remote_url.is_empty() {
                url::Url::parse(remote_url).map_err(|e| {
                    SessionError::invalid_settings(format!("Invalid remote URL '{remote_url}': {e}"))
                })?;
            }
        }

        if self.language.is_empty() {
            return Err(SessionError::invalid_settings("language cannot be empty"));
        }

        Ok(())
    }

    /// True when the helper has everything it needs to start syncing.
    pub fn is_complete(&self) -> bool {
        [
            &self.credential_token,
            &self.remote_url,
            &self.remote_container,
            &self.local_directory,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|value| !value.is_empty()))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field(
                "credential_token",
                &self.credential_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("remote_url", &self.remote_url)
            .field("remote_container", &self.remote_container)
            .field("local_directory", &self.local_directory)
            .field("exclude_patterns", &self.exclude_patterns)
            .field("language", &self.language)
            .field("sync_on_start", &self.sync_on_start)
            .finish()
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_sync_on_start() -> bool {
    true
}

fn language_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_language))
}

/// Older helpers send a single exclude-file path (or null) instead of a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExcludeField {
    One(String),
    Many(Vec<String>),
}

fn exclude_patterns<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<ExcludeField>::deserialize(deserializer)?;
    Ok(match field {
        None => BTreeSet::new(),
        Some(ExcludeField::One(pattern)) if pattern.is_empty() => BTreeSet::new(),
        Some(ExcludeField::One(pattern)) => BTreeSet::from([pattern]),
        Some(ExcludeField::Many(patterns)) => patterns.into_iter().collect(),
    })
}
