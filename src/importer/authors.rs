//! Author resolution
//!
//! Maps WordPress author logins to platform users from a map string of
//! comma-separated `login:email` pairs. The first pair that resolves to an
//! existing user becomes the fallback author for every unmapped login.

use std::collections::HashMap;

use super::report::{ImportWarning, WarningKind};
use crate::error::ImportError;
use crate::platform::{UserDirectory, UserRef};

/// One `login:email` entry of the author map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorPair {
    pub source_id: String,
    pub email: String,
}

/// Split an author map into pairs, in map order.
///
/// Returns the well-formed pairs and the malformed fragments. Blank fragments
/// (e.g. a trailing comma) are neither.
pub fn parse_author_map(map: &str) -> (Vec<AuthorPair>, Vec<String>) {
    let mut pairs = Vec::new();
    let mut malformed = Vec::new();
    for fragment in map.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        match fragment.split_once(':') {
            Some((source_id, email))
                if !source_id.trim().is_empty() && !email.trim().is_empty() =>
            {
                pairs.push(AuthorPair {
                    source_id: source_id.trim().to_string(),
                    email: email.trim().to_string(),
                });
            }
            _ => malformed.push(fragment.to_string()),
        }
    }
    (pairs, malformed)
}

/// Resolved author map with its fallback user
#[derive(Debug, Clone)]
pub struct AuthorMapping {
    users: HashMap<String, UserRef>,
    fallback: UserRef,
    warnings: Vec<ImportWarning>,
}

impl AuthorMapping {
    /// Resolve every pair of `map` against `directory`
    pub fn resolve(map: &str, directory: &dyn UserDirectory) -> Result<Self, ImportError> {
        let (pairs, malformed) = parse_author_map(map);
        if pairs.is_empty() {
            return Err(ImportError::MissingAuthorMap);
        }

        let mut warnings: Vec<ImportWarning> = malformed
            .into_iter()
            .map(|fragment| {
                log::warn!("Ignoring malformed author map entry '{}'", fragment);
                ImportWarning {
                    kind: WarningKind::MalformedAuthorPair,
                    subject: fragment,
                    message: "expected login:email".to_string(),
                }
            })
            .collect();

        let mut users = HashMap::new();
        let mut fallback: Option<UserRef> = None;
        for pair in pairs {
            match directory.find_by_email(&pair.email)? {
                Some(user) => {
                    log::info!(
                        "Mapped WP author '{}' → user {} ({})",
                        pair.source_id,
                        user.id,
                        user.email
                    );
                    if fallback.is_none() {
                        fallback = Some(user.clone());
                    }
                    users.insert(pair.source_id, user);
                }
                None => {
                    log::warn!("No user found for {}", pair.email);
                    warnings.push(ImportWarning {
                        kind: WarningKind::UnresolvedAuthor,
                        subject: pair.email,
                        message: format!("no user found for WP author '{}'", pair.source_id),
                    });
                }
            }
        }

        let fallback = fallback.ok_or(ImportError::NoAuthorResolved)?;
        Ok(Self {
            users,
            fallback,
            warnings,
        })
    }

    /// The user for a WordPress login, or the fallback author
    pub fn author_for(&self, source_id: &str) -> &UserRef {
        self.users.get(source_id).unwrap_or(&self.fallback)
    }

    pub fn fallback(&self) -> &UserRef {
        &self.fallback
    }

    /// Number of logins with an explicit mapping
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Malformed and unresolved entries met while resolving
    pub fn warnings(&self) -> &[ImportWarning] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryPlatform;

    fn directory() -> MemoryPlatform {
        MemoryPlatform::new()
            .with_user("1", "alice@example.com")
            .with_user("2", "bob@example.com")
    }

    #[test]
    fn test_parse_author_map() {
        let (pairs, malformed) =
            parse_author_map(" alice:alice@example.com, broken ,:x@example.com,carol:, bob : bob@example.com ,");
        assert_eq!(
            pairs,
            vec![
                AuthorPair {
                    source_id: "alice".into(),
                    email: "alice@example.com".into()
                },
                AuthorPair {
                    source_id: "bob".into(),
                    email: "bob@example.com".into()
                },
            ]
        );
        assert_eq!(malformed, vec!["broken", ":x@example.com", "carol:"]);
    }

    #[test]
    fn test_email_may_contain_colon() {
        let (pairs, _) = parse_author_map("alice:odd:addr@example.com");
        assert_eq!(pairs[0].email, "odd:addr@example.com");
    }

    #[test]
    fn test_fallback_is_first_resolved_pair() {
        let mapping = AuthorMapping::resolve(
            "ghost:ghost@example.com,bob:bob@example.com,alice:alice@example.com",
            &directory(),
        )
        .unwrap();
        assert_eq!(mapping.fallback().id, "2");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.author_for("alice").id, "1");
        // Unresolved and unknown logins both fall back
        assert_eq!(mapping.author_for("ghost").id, "2");
        assert_eq!(mapping.author_for("nobody").id, "2");

        assert_eq!(mapping.warnings().len(), 1);
        assert_eq!(mapping.warnings()[0].kind, WarningKind::UnresolvedAuthor);
        assert_eq!(mapping.warnings()[0].subject, "ghost@example.com");
    }

    #[test]
    fn test_empty_map_is_fatal() {
        let err = AuthorMapping::resolve("", &directory()).unwrap_err();
        assert!(matches!(err, ImportError::MissingAuthorMap));
        let err = AuthorMapping::resolve("nocolon, ,", &directory()).unwrap_err();
        assert!(matches!(err, ImportError::MissingAuthorMap));
    }

    #[test]
    fn test_nothing_resolves_is_fatal() {
        let err = AuthorMapping::resolve("ghost:ghost@example.com", &directory()).unwrap_err();
        assert!(matches!(err, ImportError::NoAuthorResolved));
    }
}
