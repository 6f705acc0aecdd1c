//! Route handlers for the session gateway.
//!
//! Each handler records exactly one audit event before producing its
//! response, and session mutation happens before any redirect that refers
//! to the new state. No login failure is fatal: everything funnels back to
//! `/login` with an error code the login page can display.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use gatehouse_access::{AuditEvent, AuditKind, AuthFlowError, Session};

use super::{AppState, ClientIp, SessionStore};
use crate::pages;

/// Query parameters for the login route.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Destination to resume after login. Defaults to `/`.
    next: Option<String>,
    /// Error code from a previous failed attempt, surfaced for display.
    error: Option<String>,
    error_description: Option<String>,
}

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange, on success.
    code: Option<String>,
    /// The destination captured at login time.
    state: Option<String>,
    /// Error code, when the provider refused or the user declined.
    error: Option<String>,
    error_description: Option<String>,
}

/// Builds the gateway router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", get(logout))
        .route("/protected", get(protected))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Home page: routes by authentication state.
pub async fn home(
    State(app): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    store: SessionStore,
) -> Redirect {
    match store.get() {
        Some(session) => {
            app.audit.record(AuditEvent::for_user(
                AuditKind::Access,
                session.userinfo(),
                &client_ip,
                "home page accessed with active session, redirecting to /protected",
            ));
            Redirect::to("/protected")
        }
        None => {
            app.audit.record(AuditEvent::anonymous(
                AuditKind::Access,
                &client_ip,
                "home page accessed without session, redirecting to /login",
            ));
            Redirect::to("/login")
        }
    }
}

/// Initiates the login flow by redirecting to the identity provider.
///
/// The caller-supplied `next` destination rides along in the OAuth `state`
/// parameter and comes back on the callback.
pub async fn login(
    State(app): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    Query(query): Query<LoginQuery>,
) -> Redirect {
    if let Some(error) = &query.error {
        match &query.error_description {
            Some(description) => tracing::warn!(
                error = %error,
                description = %description,
                "login page reached with error from previous attempt",
            ),
            None => tracing::warn!(
                error = %error,
                "login page reached with error from previous attempt",
            ),
        }
    }

    let next = sanitize_destination(query.next.as_deref());
    app.audit.record(AuditEvent::anonymous(
        AuditKind::Access,
        &client_ip,
        format!("login initiated, next={next}"),
    ));

    Redirect::to(&app.provider.authorize_url(&next))
}

/// Handles the provider callback: completes or aborts the login.
pub async fn callback(
    State(app): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    Query(query): Query<CallbackQuery>,
    store: SessionStore,
) -> Response {
    // A provider-echoed error means the provider refused or the user
    // declined consent. Recoverable; back to the login page.
    if let Some(code) = query.error {
        let error = AuthFlowError::Provider {
            code,
            description: query.error_description.unwrap_or_default(),
        };
        return abort_login(&app, &client_ip, &error).into_response();
    }

    let destination = sanitize_destination(query.state.as_deref());
    let Some(code) = query.code else {
        let error = AuthFlowError::Exchange {
            reason: "callback missing authorization code".to_string(),
        };
        return abort_login(&app, &client_ip, &error).into_response();
    };

    match app.provider.exchange_code(&code).await {
        Ok(grant) => {
            let session = Session::new(grant.access_token, grant.userinfo);
            let store = match store.set(&session) {
                Ok(store) => store,
                Err(e) => {
                    let error = AuthFlowError::Exchange {
                        reason: format!("failed to encode session: {e}"),
                    };
                    return abort_login(&app, &client_ip, &error).into_response();
                }
            };
            app.audit.record(AuditEvent::for_user(
                AuditKind::LoginSuccess,
                session.userinfo(),
                &client_ip,
                format!("login succeeded, redirecting to {destination}"),
            ));
            (store, Redirect::to(&destination)).into_response()
        }
        Err(error) => abort_login(&app, &client_ip, &error).into_response(),
    }
}

/// Terminates the session and hands off to the provider logout.
pub async fn logout(
    State(app): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    store: SessionStore,
) -> impl IntoResponse {
    match store.get() {
        Some(session) => app.audit.record(AuditEvent::for_user(
            AuditKind::Logout,
            session.userinfo(),
            &client_ip,
            "user logged out",
        )),
        None => app.audit.record(AuditEvent::anonymous(
            AuditKind::Logout,
            &client_ip,
            "logout attempted without active session",
        )),
    }

    let store = store.clear();
    let logout_url = app.provider.logout_url(app.home_url());
    (store, Redirect::to(&logout_url))
}

/// The gated resource.
///
/// A session or a bearer `Authorization` header authorizes the request;
/// anything else starts a fresh login remembering the destination.
pub async fn protected(
    State(app): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    store: SessionStore,
) -> Response {
    let session = store.get();
    let has_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("Bearer "));

    if session.is_none() && !has_bearer {
        app.audit.record(AuditEvent::anonymous(
            AuditKind::UnauthorizedAccess,
            &client_ip,
            "unauthorized access attempt to /protected",
        ));
        return Redirect::to("/login?next=/protected").into_response();
    }

    let userinfo = session
        .as_ref()
        .map(Session::userinfo)
        .cloned()
        .unwrap_or_default();
    app.audit.record(AuditEvent::for_user(
        AuditKind::Access,
        &userinfo,
        &client_ip,
        "authorized access to /protected",
    ));

    pages::protected_page(&userinfo).into_response()
}

/// Records the failure and redirects back to the login page.
fn abort_login(app: &AppState, client_ip: &str, error: &AuthFlowError) -> Redirect {
    app.audit.record(AuditEvent::anonymous(
        AuditKind::LoginFailure,
        client_ip,
        error.to_string(),
    ));
    Redirect::to(&format!("/login?error={}", error.login_error_code()))
}

/// Constrains a redirect destination to a local path.
///
/// The `state` parameter round-trips through the identity provider and is
/// attacker-influenced; anything that is not a same-site path collapses to
/// the home page.
fn sanitize_destination(raw: Option<&str>) -> String {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}
