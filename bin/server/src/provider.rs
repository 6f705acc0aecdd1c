//! Identity provider client built on the openidconnect crate.
//!
//! The gateway treats the provider as an opaque capability behind the
//! [`IdentityProvider`] trait: initiate an authorization redirect, exchange
//! a code for tokens, and build the provider logout URL. Protocol work
//! (discovery, code exchange, ID-token validation) is the library's job.

use async_trait::async_trait;
use base64::Engine;
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreProviderMetadata,
};
use openidconnect::{
    AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, Nonce, OAuth2TokenResponse,
    RedirectUrl, Scope, TokenResponse,
};
use serde_json::{Map, Value};
use url::Url;

use gatehouse_access::{AuthFlowError, UserInfo};

use crate::config::OidcConfig;

/// External identity provider capability.
///
/// The `state` passed to [`authorize_url`](Self::authorize_url) is the
/// destination path to resume after login; the provider echoes it back on
/// the callback.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the provider authorization URL carrying the given state.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for tokens and identity claims.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthFlowError>;

    /// Builds the provider end-session URL with a `returnTo` back at the
    /// gateway.
    fn logout_url(&self, return_to: &str) -> String;
}

/// Result of a successful token exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    /// The access token, kept opaque.
    pub access_token: String,
    /// Identity claims extracted from the ID token.
    pub userinfo: UserInfo,
}

/// Auth0 client for authenticating users.
pub struct Auth0Client {
    provider_metadata: CoreProviderMetadata,
    client_id: ClientId,
    client_secret: ClientSecret,
    redirect_url: RedirectUrl,
    logout_endpoint: Url,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl Auth0Client {
    /// Creates a new client by discovering the provider metadata.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration produces invalid URLs or
    /// the discovery document cannot be fetched.
    pub async fn discover(
        config: &OidcConfig,
        redirect_uri: &str,
    ) -> Result<Self, ProviderInitError> {
        let issuer_url = IssuerUrl::new(config.issuer_url())
            .map_err(|e| ProviderInitError::Configuration(format!("invalid issuer URL: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                ProviderInitError::Configuration(format!("failed to create HTTP client: {}", e))
            })?;

        let provider_metadata = CoreProviderMetadata::discover_async(issuer_url, &http_client)
            .await
            .map_err(|e| {
                ProviderInitError::Discovery(format!("failed to discover provider: {}", e))
            })?;

        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| ProviderInitError::Configuration(format!("invalid redirect URI: {}", e)))?;

        // Auth0 does not advertise an end-session endpoint in its
        // discovery document; the documented logout URL lives under /v2.
        let logout_endpoint = Url::parse(&format!("https://{}/v2/logout", config.domain))
            .map_err(|e| ProviderInitError::Configuration(format!("invalid logout URL: {}", e)))?;

        Ok(Self {
            provider_metadata,
            client_id: ClientId::new(config.client_id.clone()),
            client_secret: ClientSecret::new(config.client_secret.clone()),
            redirect_url,
            logout_endpoint,
            scopes: config.scopes().iter().map(|s| s.to_string()).collect(),
            http_client,
        })
    }

    fn core_client(
        &self,
    ) -> CoreClient<
        openidconnect::EndpointSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointNotSet,
        openidconnect::EndpointMaybeSet,
        openidconnect::EndpointMaybeSet,
    > {
        CoreClient::from_provider_metadata(
            self.provider_metadata.clone(),
            self.client_id.clone(),
            Some(self.client_secret.clone()),
        )
        .set_redirect_uri(self.redirect_url.clone())
    }
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    fn authorize_url(&self, state: &str) -> String {
        let client = self.core_client();

        // The state parameter carries the post-login destination; the
        // session is stateless across the provider round trip, so there is
        // nowhere to park a PKCE verifier. The confidential client secret
        // protects the exchange instead.
        let destination = state.to_string();
        let mut auth_request = client.authorize_url(
            CoreAuthenticationFlow::AuthorizationCode,
            move || CsrfToken::new(destination),
            Nonce::new_random,
        );

        for scope in &self.scopes {
            auth_request = auth_request.add_scope(Scope::new(scope.clone()));
        }

        let (auth_url, _state, _nonce) = auth_request.url();
        auth_url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthFlowError> {
        let client = self.core_client();

        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(|e| AuthFlowError::Exchange {
                reason: format!("token endpoint error: {}", e),
            })?
            .request_async(&self.http_client)
            .await
            .map_err(|e| AuthFlowError::Exchange {
                reason: format!("token exchange failed: {}", e),
            })?;

        let id_token = token_response.id_token().ok_or_else(|| AuthFlowError::Exchange {
            reason: "no ID token in response".to_string(),
        })?;

        let claims = id_token
            .claims(&client.id_token_verifier(), accept_any_nonce)
            .map_err(|e| AuthFlowError::Exchange {
                reason: format!("ID token validation failed: {}", e),
            })?;

        let mut userinfo = UserInfo::new(claims.subject().to_string())
            .with_email(claims.email().map(|e| e.as_str().to_string()))
            .with_name(
                claims
                    .name()
                    .and_then(|n| n.get(None))
                    .map(|n| n.as_str().to_string()),
            );

        // Retain the full claim set for rendering. The raw ID token string
        // is pulled back out of the serialized response, then its payload
        // segment decoded as base64url JSON.
        let response_json = serde_json::to_value(&token_response).unwrap_or_default();
        if let Some(map) = response_json
            .get("id_token")
            .and_then(Value::as_str)
            .and_then(decode_jwt_payload)
        {
            userinfo = userinfo.with_claims(map);
        }

        Ok(TokenGrant {
            access_token: token_response.access_token().secret().clone(),
            userinfo,
        })
    }

    fn logout_url(&self, return_to: &str) -> String {
        let mut url = self.logout_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("returnTo", return_to);
        url.to_string()
    }
}

/// Nonce verifier that accepts any nonce.
///
/// The callback carries no per-login server state to compare against; the
/// signature and issuer checks still run in the library.
fn accept_any_nonce(_nonce: Option<&Nonce>) -> Result<(), String> {
    Ok(())
}

/// Decodes the payload segment of a JWT into a JSON claim map.
///
/// JWTs are `base64url(header).base64url(payload).signature`. Returns
/// `None` for anything that does not look like one; the caller degrades to
/// the standard claims.
fn decode_jwt_payload(raw_jwt: &str) -> Option<Map<String, Value>> {
    let payload = raw_jwt.split('.').nth(1)?;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .ok()?;
    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Errors constructing the provider client at startup.
#[derive(Debug)]
pub enum ProviderInitError {
    /// Configuration error (invalid URLs, etc.)
    Configuration(String),
    /// Failed to discover provider metadata.
    Discovery(String),
}

impl std::fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "OIDC configuration error: {}", msg),
            Self::Discovery(msg) => write!(f, "OIDC discovery error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderInitError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fake_jwt(payload: &Value) -> String {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = engine.encode(serde_json::to_vec(payload).expect("serialize payload"));
        format!("{header}.{body}.signature")
    }

    #[test]
    fn jwt_payload_decodes_to_claim_map() {
        let jwt = fake_jwt(&json!({
            "sub": "auth0|abc",
            "email": "user@example.com",
            "https://example.com/roles": ["reader"]
        }));

        let map = decode_jwt_payload(&jwt).expect("decode");
        assert_eq!(map.get("sub").and_then(Value::as_str), Some("auth0|abc"));
        assert!(map.contains_key("https://example.com/roles"));
    }

    #[test]
    fn malformed_jwt_decodes_to_none() {
        assert!(decode_jwt_payload("not-a-jwt").is_none());
        assert!(decode_jwt_payload("a.!!!.c").is_none());
        assert!(decode_jwt_payload("").is_none());
    }

    #[test]
    fn non_object_payload_decodes_to_none() {
        let engine = &base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let jwt = format!("h.{}.s", engine.encode(b"[1,2,3]"));
        assert!(decode_jwt_payload(&jwt).is_none());
    }
}
