//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, e.g. `OIDC__DOMAIN`, `SESSION__SECURE_COOKIES`.

use serde::Deserialize;

/// Minimum length of the cookie-signing secret, in bytes.
const MIN_SECRET_KEY_BYTES: usize = 32;

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Application secret used to derive the cookie-signing key.
    pub secret_key: String,

    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Public base URL of this gateway, used to build the OIDC redirect
    /// URI and the post-logout return URL.
    pub base_url: String,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// OIDC provider configuration.
    pub oidc: OidcConfig,
}

/// Session-cookie configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session duration in minutes, enforced via the cookie max-age.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local
    /// HTTP development.
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

/// Configuration for the OIDC identity provider (Auth0).
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    /// The provider tenant domain (e.g. "example.eu.auth0.com").
    /// Used to build the discovery URL and the logout endpoint.
    pub domain: String,

    /// The OAuth2 client ID registered with the provider.
    pub client_id: String,

    /// The OAuth2 client secret.
    pub client_secret: String,

    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_secure_cookies() -> bool {
    true
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: default_secure_cookies(),
        }
    }
}

impl OidcConfig {
    /// Returns the issuer URL used for OIDC discovery.
    #[must_use]
    pub fn issuer_url(&self) -> String {
        format!("https://{}/", self.domain)
    }

    /// Returns the OAuth2 scopes to request, parsed from the
    /// comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid,
    /// including a secret key too short to sign cookies with.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let cfg: Self = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the secret key is shorter than 32 bytes.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.secret_key.len() < MIN_SECRET_KEY_BYTES {
            return Err(config::ConfigError::Message(format!(
                "secret_key must be at least {MIN_SECRET_KEY_BYTES} bytes, got {}",
                self.secret_key.len()
            )));
        }
        Ok(())
    }

    /// Returns the OIDC redirect URI for the `/callback` route.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("{}/callback", self.base_url.trim_end_matches('/'))
    }

    /// Returns the home URL used as the post-logout `returnTo`.
    #[must_use]
    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secret_key: &str) -> ServerConfig {
        ServerConfig {
            secret_key: secret_key.to_string(),
            listen_addr: default_listen_addr(),
            base_url: "https://gateway.example.com".to_string(),
            session: SessionConfig::default(),
            oidc: OidcConfig {
                domain: "example.eu.auth0.com".to_string(),
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                scopes: default_scopes(),
            },
        }
    }

    #[test]
    fn session_config_has_correct_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.duration_minutes, 60);
        assert!(config.secure_cookies);
    }

    #[test]
    fn issuer_url_is_built_from_domain() {
        let config = test_config(&"k".repeat(64));
        assert_eq!(config.oidc.issuer_url(), "https://example.eu.auth0.com/");
    }

    #[test]
    fn scopes_parse_comma_separated() {
        let oidc: OidcConfig = serde_json::from_str(
            r#"{
                "domain": "example.eu.auth0.com",
                "client_id": "id",
                "client_secret": "secret",
                "scopes": "openid, profile, email"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(oidc.scopes(), vec!["openid", "profile", "email"]);
    }

    #[test]
    fn oidc_config_deserializes_with_default_scopes() {
        let oidc: OidcConfig = serde_json::from_str(
            r#"{
                "domain": "example.eu.auth0.com",
                "client_id": "id",
                "client_secret": "secret"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(oidc.scopes(), vec!["openid", "profile", "email"]);
    }

    #[test]
    fn short_secret_key_is_rejected() {
        let config = test_config("too-short");
        assert!(config.validate().is_err());
        assert!(test_config(&"k".repeat(64)).validate().is_ok());
    }

    #[test]
    fn urls_tolerate_trailing_slash_in_base() {
        let mut config = test_config(&"k".repeat(64));
        config.base_url = "https://gateway.example.com/".to_string();
        assert_eq!(
            config.redirect_uri(),
            "https://gateway.example.com/callback"
        );
        assert_eq!(config.home_url(), "https://gateway.example.com/");
    }
}
