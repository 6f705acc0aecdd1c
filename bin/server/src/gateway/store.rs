//! Session store backed by a signed cookie.
//!
//! The store is an explicit get/set/clear seam over the client's cookie
//! jar: the session is only ever read and written within that client's own
//! request, so there is no cross-request locking and no server-side state.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::{IntoResponseParts, ResponseParts};
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::convert::Infallible;
use std::sync::Arc;
use time::Duration;

use gatehouse_access::Session;

use super::AppState;
use crate::config::SessionConfig;

/// Per-client session persistence over the signed cookie jar.
///
/// Extracted per request; returned from handlers as response parts so the
/// cookie mutations reach the client. A cookie with a bad signature or a
/// malformed payload reads as no session at all.
pub struct SessionStore {
    jar: SignedCookieJar,
    settings: SessionConfig,
}

impl SessionStore {
    /// Returns the current session, if the client presented a valid one.
    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.jar
            .get(&self.settings.cookie_name)
            .and_then(|cookie| Session::decode(cookie.value()))
    }

    /// Writes the session into the cookie jar.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized.
    pub fn set(mut self, session: &Session) -> Result<Self, serde_json::Error> {
        let payload = session.encode()?;
        let cookie = Cookie::build((self.settings.cookie_name.clone(), payload))
            .path("/")
            .http_only(true)
            .secure(self.settings.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(Duration::minutes(self.settings.duration_minutes));
        self.jar = self.jar.add(cookie);
        Ok(self)
    }

    /// Clears the session cookie.
    #[must_use]
    pub fn clear(mut self) -> Self {
        let cookie = Cookie::build((self.settings.cookie_name.clone(), ""))
            .path("/")
            .max_age(Duration::ZERO);
        self.jar = self.jar.add(cookie);
        self
    }
}

impl<S> FromRequestParts<S> for SessionStore
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let jar = SignedCookieJar::from_headers(&parts.headers, app_state.cookie_key());
        Ok(Self {
            jar,
            settings: app_state.session_settings().clone(),
        })
    }
}

impl IntoResponseParts for SessionStore {
    type Error = <SignedCookieJar as IntoResponseParts>::Error;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        self.jar.into_response_parts(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::extract::cookie::Key;
    use gatehouse_access::UserInfo;

    fn test_store() -> SessionStore {
        SessionStore {
            jar: SignedCookieJar::new(Key::from(&[7u8; 64])),
            settings: SessionConfig {
                secure_cookies: false,
                ..SessionConfig::default()
            },
        }
    }

    fn test_session() -> Session {
        Session::new(
            "at_test".to_string(),
            UserInfo::new("auth0|store").with_email(Some("store@example.com".to_string())),
        )
    }

    #[test]
    fn empty_jar_has_no_session() {
        assert!(test_store().get().is_none());
    }

    #[test]
    fn set_then_get_roundtrips_through_signed_jar() {
        let store = test_store().set(&test_session()).expect("set");
        let read = store.get().expect("session present");
        assert_eq!(read.access_token(), "at_test");
        assert_eq!(read.userinfo().subject_or_unknown(), "auth0|store");
    }

    #[test]
    fn clear_removes_the_session() {
        let store = test_store().set(&test_session()).expect("set");
        let store = store.clear();
        assert!(store.get().is_none());
    }
}
