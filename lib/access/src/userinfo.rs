//! User identity extracted from OIDC claims.
//!
//! The identity provider is free to omit any claim; accessors default the
//! values the audit trail cares about to the explicit [`UNKNOWN`] sentinel
//! instead of leaving callers to pattern-match on absence.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel recorded in audit events when a claim is absent.
pub const UNKNOWN: &str = "unknown";

/// Identity claims for an authenticated user.
///
/// All fields are optional: a provider may withhold `email` (or even `sub`
/// in degenerate cases) without blocking the login flow. The full raw claim
/// set is retained in `claims` for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The subject claim (unique user identifier from the provider).
    subject: Option<String>,
    /// Email address, when the provider supplies one.
    email: Option<String>,
    /// Display name, when the provider supplies one.
    name: Option<String>,
    /// The complete raw claim map from the ID token payload.
    #[serde(default)]
    claims: Map<String, Value>,
}

impl UserInfo {
    /// Creates user info with a subject claim.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Sets the raw claim map.
    #[must_use]
    pub fn with_claims(mut self, claims: Map<String, Value>) -> Self {
        self.claims = claims;
        self
    }

    /// Builds user info from a raw claim map, lifting the standard claims.
    #[must_use]
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let text = |key: &str| {
            claims
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            subject: text("sub"),
            email: text("email"),
            name: text("name"),
            claims,
        }
    }

    /// Returns the subject claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the email claim, if present.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the display name, if present.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the subject claim, or [`UNKNOWN`] when absent.
    #[must_use]
    pub fn subject_or_unknown(&self) -> &str {
        self.subject.as_deref().unwrap_or(UNKNOWN)
    }

    /// Returns the email claim, or [`UNKNOWN`] when absent.
    #[must_use]
    pub fn email_or_unknown(&self) -> &str {
        self.email.as_deref().unwrap_or(UNKNOWN)
    }

    /// Returns the complete raw claim map.
    #[must_use]
    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_default_to_unknown() {
        let info = UserInfo::default();
        assert_eq!(info.subject_or_unknown(), UNKNOWN);
        assert_eq!(info.email_or_unknown(), UNKNOWN);
        assert!(info.subject().is_none());
        assert!(info.email().is_none());
    }

    #[test]
    fn builder_sets_claims() {
        let info = UserInfo::new("auth0|123456")
            .with_email(Some("alice@example.com".to_string()))
            .with_name(Some("Alice".to_string()));

        assert_eq!(info.subject_or_unknown(), "auth0|123456");
        assert_eq!(info.email_or_unknown(), "alice@example.com");
        assert_eq!(info.name(), Some("Alice"));
    }

    #[test]
    fn from_claims_lifts_standard_claims() {
        let raw = json!({
            "sub": "auth0|abc",
            "email": "bob@example.com",
            "name": "Bob",
            "nickname": "bobby"
        });
        let Value::Object(map) = raw else {
            panic!("expected object");
        };

        let info = UserInfo::from_claims(map);
        assert_eq!(info.subject(), Some("auth0|abc"));
        assert_eq!(info.email(), Some("bob@example.com"));
        assert_eq!(info.name(), Some("Bob"));
        assert_eq!(
            info.claims().get("nickname").and_then(Value::as_str),
            Some("bobby")
        );
    }

    #[test]
    fn from_claims_tolerates_missing_email() {
        let raw = json!({ "sub": "auth0|abc" });
        let Value::Object(map) = raw else {
            panic!("expected object");
        };

        let info = UserInfo::from_claims(map);
        assert_eq!(info.subject_or_unknown(), "auth0|abc");
        assert_eq!(info.email_or_unknown(), UNKNOWN);
    }

    #[test]
    fn serialization_roundtrip() {
        let info = UserInfo::new("auth0|xyz").with_email(Some("x@example.com".to_string()));
        let json = serde_json::to_string(&info).expect("serialize");
        let parsed: UserInfo = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(info, parsed);
    }
}
