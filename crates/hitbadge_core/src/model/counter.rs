//! Counter key and row types.
//!
//! # Responsibility
//! - Validate user/repo identifiers before they reach storage.
//! - Carry query results between the store and its callers.
//!
//! # Invariants
//! - `CounterKey` can only be built from identifiers matching
//!   `[A-Za-z0-9_.-]+`.
//! - Counter rows always hold `count >= 0`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Character class accepted for user and repo identifiers.
pub const IDENTIFIER_PATTERN: &str = r"^[A-Za-z0-9_.-]+$";

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).expect("valid identifier regex"));

/// Returns whether `value` is a legal user or repo identifier.
pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_RE.is_match(value)
}

/// Which half of a counter key failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPart {
    User,
    Repo,
}

impl Display for KeyPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Repo => write!(f, "repo"),
        }
    }
}

/// Validation failure for counter identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValidationError {
    Empty(KeyPart),
    InvalidCharacters { part: KeyPart, value: String },
}

impl Display for KeyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty(part) => write!(f, "{part} cannot be empty"),
            Self::InvalidCharacters { part, value } => write!(
                f,
                "{part} `{value}` contains characters outside [A-Za-z0-9_.-]"
            ),
        }
    }
}

impl Error for KeyValidationError {}

/// Unique identity of one counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CounterKey {
    user: String,
    repo: String,
}

impl CounterKey {
    /// Builds a key after validating both identifiers.
    pub fn new(user: impl Into<String>, repo: impl Into<String>) -> Result<Self, KeyValidationError> {
        let user = user.into();
        let repo = repo.into();
        validate_identifier(KeyPart::User, &user)?;
        validate_identifier(KeyPart::Repo, &repo)?;
        Ok(Self { user, repo })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for CounterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user, self.repo)
    }
}

/// Validates one identifier on its own, for user-scoped queries.
pub fn validate_identifier(part: KeyPart, value: &str) -> Result<(), KeyValidationError> {
    if value.is_empty() {
        return Err(KeyValidationError::Empty(part));
    }
    if !is_valid_identifier(value) {
        return Err(KeyValidationError::InvalidCharacters {
            part,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// One repo's count within a single user's counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCount {
    pub repo: String,
    pub count: u64,
}

/// One counter row from a global scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRepoCount {
    pub user: String,
    pub repo: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::{is_valid_identifier, CounterKey, KeyPart, KeyValidationError};

    #[test]
    fn accepts_github_style_names() {
        let key = CounterKey::new("octo-cat", "hello_world.rs").unwrap();
        assert_eq!(key.user(), "octo-cat");
        assert_eq!(key.repo(), "hello_world.rs");
        assert_eq!(key.to_string(), "octo-cat/hello_world.rs");
    }

    #[test]
    fn rejects_empty_parts() {
        assert_eq!(
            CounterKey::new("", "repo").unwrap_err(),
            KeyValidationError::Empty(KeyPart::User)
        );
        assert_eq!(
            CounterKey::new("user", "").unwrap_err(),
            KeyValidationError::Empty(KeyPart::Repo)
        );
    }

    #[test]
    fn rejects_characters_outside_class() {
        for bad in ["a/b", "a b", "caf\u{e9}", "x?y", "[x]", "a`b"] {
            assert!(!is_valid_identifier(bad), "`{bad}` should be rejected");
        }
        let err = CounterKey::new("user", "re po").unwrap_err();
        assert!(matches!(
            err,
            KeyValidationError::InvalidCharacters { part: KeyPart::Repo, .. }
        ));
    }
}
