//! Namespaced sound identifiers.
//!
//! Sound keys are stable string identifiers of the form `namespace:path`
//! (e.g., `minecraft:entity.arrow.shoot`). They are ordered and validated so
//! block lists, cull tables and replacement tables can be keyed on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default namespace used when a key omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`SoundKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoundKeyError {
    /// Input was empty or whitespace.
    #[error("sound key cannot be empty")]
    Empty,
    /// Namespace segment failed validation.
    #[error("sound key namespace `{0}` is invalid (allowed: a-z0-9_.-, max 64)")]
    Namespace(String),
    /// Path segment failed validation.
    #[error("sound key path `{0}` is invalid (allowed: a-z0-9_./-, max 128)")]
    Path(String),
}

/// A namespaced sound identifier of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SoundKey {
    namespace: String,
    path: String,
}

impl SoundKey {
    /// Parse a sound key.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, SoundKeyError> {
        Self::parse_with_default_namespace(input, DEFAULT_NAMESPACE)
    }

    /// Parse a sound key using a caller-provided default namespace.
    pub fn parse_with_default_namespace(
        input: &str,
        default_namespace: &str,
    ) -> Result<Self, SoundKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SoundKeyError::Empty);
        }

        let (namespace, path) = input.split_once(':').unwrap_or((default_namespace, input));
        let namespace = namespace.trim();
        let path = path.trim();

        if !valid_namespace(namespace) {
            return Err(SoundKeyError::Namespace(namespace.to_string()));
        }
        if !valid_path(path) {
            return Err(SoundKeyError::Path(path.to_string()));
        }

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Sound key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Sound key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for SoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for SoundKey {
    type Err = SoundKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SoundKey {
    type Error = SoundKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SoundKey> for String {
    fn from(key: SoundKey) -> Self {
        key.to_string()
    }
}

fn valid_namespace(ns: &str) -> bool {
    !ns.is_empty()
        && ns.len() <= 64
        && ns
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
}

fn valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.len() <= 128
        && path
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespaced_key() {
        let key = SoundKey::parse("dsurround:bow.loose").unwrap();
        assert_eq!(key.namespace(), "dsurround");
        assert_eq!(key.path(), "bow.loose");
        assert_eq!(key.to_string(), "dsurround:bow.loose");
    }

    #[test]
    fn parses_with_default_namespace() {
        let key = SoundKey::parse("entity.arrow.shoot").unwrap();
        assert_eq!(key.to_string(), "minecraft:entity.arrow.shoot");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(SoundKey::parse(""), Err(SoundKeyError::Empty));
        assert_eq!(SoundKey::parse("   "), Err(SoundKeyError::Empty));
    }

    #[test]
    fn rejects_invalid_chars() {
        assert!(SoundKey::parse("minecraft:Thunder").is_err());
        assert!(SoundKey::parse("MC:thunder").is_err());
        assert!(SoundKey::parse("minecraft:thunder?").is_err());
        assert!(SoundKey::parse("minecraft:").is_err());
        assert!(SoundKey::parse(":thunder").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let key = SoundKey::parse("minecraft:ambient.cave").unwrap();
        let back: SoundKey = String::from(key.clone()).try_into().unwrap();
        assert_eq!(back, key);
    }
}
