//! Session state for authenticated users.
//!
//! A session is created after a successful OIDC callback and travels with
//! the client as JSON inside a signed cookie. The gateway never keeps
//! server-side session state; expiry is delegated to the cookie max-age
//! enforced by the browser and the signature enforced by the jar.

use serde::{Deserialize, Serialize};

use crate::userinfo::UserInfo;

/// An established, authenticated session.
///
/// Holds the opaque bearer credential obtained from the token exchange and
/// the identity claims extracted alongside it. Presence of a decodable
/// session in the cookie jar is what makes a request authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The access token from the provider, kept opaque.
    access_token: String,
    /// Identity claims captured at login time.
    userinfo: UserInfo,
}

impl Session {
    /// Creates a session from the results of a token exchange.
    #[must_use]
    pub fn new(access_token: String, userinfo: UserInfo) -> Self {
        Self {
            access_token,
            userinfo,
        }
    }

    /// Returns the opaque access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the identity claims captured at login.
    #[must_use]
    pub fn userinfo(&self) -> &UserInfo {
        &self.userinfo
    }

    /// Encodes the session as the cookie payload.
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes a session from a cookie payload.
    ///
    /// Returns `None` for malformed payloads: a cookie the gateway cannot
    /// read is treated the same as no cookie at all.
    #[must_use]
    pub fn decode(value: &str) -> Option<Self> {
        serde_json::from_str(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> Session {
        Session::new(
            "at_12345".to_string(),
            UserInfo::new("auth0|123").with_email(Some("alice@example.com".to_string())),
        )
    }

    #[test]
    fn session_exposes_token_and_userinfo() {
        let session = test_session();
        assert_eq!(session.access_token(), "at_12345");
        assert_eq!(session.userinfo().subject_or_unknown(), "auth0|123");
    }

    #[test]
    fn cookie_payload_roundtrip() {
        let session = test_session();
        let payload = session.encode().expect("encode");
        let parsed = Session::decode(&payload).expect("decode");
        assert_eq!(session, parsed);
    }

    #[test]
    fn malformed_payload_decodes_to_none() {
        assert!(Session::decode("not json").is_none());
        assert!(Session::decode("{\"unrelated\":true}").is_none());
    }
}
