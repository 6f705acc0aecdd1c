//! Audit-logging contract for the session gateway.
//!
//! Every authentication-relevant decision records exactly one
//! [`AuditEvent`] before the HTTP response is returned. The sink is an
//! explicit capability injected at construction, configured once at process
//! start and used read-only by all request handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::userinfo::{UNKNOWN, UserInfo};

/// The category of a security-relevant decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A page was served to an authorized (or public) request.
    Access,
    /// A login flow completed and a session was established.
    LoginSuccess,
    /// A login flow aborted: provider error or failed code exchange.
    LoginFailure,
    /// A session was terminated (or a logout was attempted without one).
    Logout,
    /// A protected resource was requested without authorization.
    UnauthorizedAccess,
}

impl AuditKind {
    /// Returns the category name as recorded in log output.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::LoginSuccess => "login_success",
            Self::LoginFailure => "login_failure",
            Self::Logout => "logout",
            Self::UnauthorizedAccess => "unauthorized_access",
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
///
/// `user_id` and `email` carry the `"unknown"` sentinel rather than an
/// absent value so the log schema stays uniform across anonymous and
/// authenticated requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// What kind of decision this records.
    pub kind: AuditKind,
    /// Subject claim of the user involved, or `"unknown"`.
    pub user_id: String,
    /// Email claim of the user involved, or `"unknown"`.
    pub email: String,
    /// Client IP derived from `X-Forwarded-For` or the socket peer.
    pub client_ip: String,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Free-form context for operators (route, error text, destination).
    pub detail: String,
}

impl AuditEvent {
    /// Creates an event for an anonymous request.
    #[must_use]
    pub fn anonymous(kind: AuditKind, client_ip: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            user_id: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            client_ip: client_ip.into(),
            timestamp: Utc::now(),
            detail: detail.into(),
        }
    }

    /// Creates an event attributed to a user's identity claims.
    #[must_use]
    pub fn for_user(
        kind: AuditKind,
        userinfo: &UserInfo,
        client_ip: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            user_id: userinfo.subject_or_unknown().to_string(),
            email: userinfo.email_or_unknown().to_string(),
            client_ip: client_ip.into(),
            timestamp: Utc::now(),
            detail: detail.into(),
        }
    }
}

/// Sink for audit events.
///
/// Implementations must write synchronously: the event has to be durable
/// (or handed to a flushing writer) before `record` returns, so the trail
/// survives abrupt process termination.
pub trait AuditLog: Send + Sync {
    /// Records one audit event.
    fn record(&self, event: AuditEvent);
}

/// Audit sink that emits structured `tracing` events.
///
/// Levels mirror the severity of the decision: failures are errors,
/// unauthorized access attempts are warnings, the rest is informational.
/// Flushing is the subscriber's responsibility; the gateway installs a
/// line-flushing stdout writer at startup.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record(&self, event: AuditEvent) {
        let timestamp = event.timestamp.to_rfc3339();
        match event.kind {
            AuditKind::LoginFailure => tracing::error!(
                category = event.kind.as_str(),
                user_id = %event.user_id,
                email = %event.email,
                client_ip = %event.client_ip,
                timestamp = %timestamp,
                "{}",
                event.detail,
            ),
            AuditKind::UnauthorizedAccess => tracing::warn!(
                category = event.kind.as_str(),
                user_id = %event.user_id,
                email = %event.email,
                client_ip = %event.client_ip,
                timestamp = %timestamp,
                "{}",
                event.detail,
            ),
            AuditKind::Access | AuditKind::LoginSuccess | AuditKind::Logout => tracing::info!(
                category = event.kind.as_str(),
                user_id = %event.user_id,
                email = %event.email,
                client_ip = %event.client_ip,
                timestamp = %timestamp,
                "{}",
                event.detail,
            ),
        }
    }
}

/// Audit sink that keeps events in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditLog {
    /// Creates an empty in-memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit log poisoned").clone()
    }

    /// Returns the recorded events of one category.
    #[must_use]
    pub fn events_of(&self, kind: AuditKind) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, event: AuditEvent) {
        self.events.lock().expect("audit log poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_event_uses_unknown_sentinels() {
        let event = AuditEvent::anonymous(AuditKind::Access, "203.0.113.9", "home page accessed");
        assert_eq!(event.user_id, UNKNOWN);
        assert_eq!(event.email, UNKNOWN);
        assert_eq!(event.client_ip, "203.0.113.9");
    }

    #[test]
    fn user_event_carries_claims() {
        let info = UserInfo::new("auth0|42").with_email(Some("a@example.com".to_string()));
        let event = AuditEvent::for_user(AuditKind::LoginSuccess, &info, "10.0.0.1", "logged in");
        assert_eq!(event.user_id, "auth0|42");
        assert_eq!(event.email, "a@example.com");
    }

    #[test]
    fn user_event_defaults_missing_email() {
        let info = UserInfo::new("auth0|42");
        let event = AuditEvent::for_user(AuditKind::LoginSuccess, &info, "10.0.0.1", "logged in");
        assert_eq!(event.email, UNKNOWN);
    }

    #[test]
    fn kind_names_match_log_schema() {
        assert_eq!(AuditKind::Access.as_str(), "access");
        assert_eq!(AuditKind::LoginSuccess.as_str(), "login_success");
        assert_eq!(AuditKind::LoginFailure.as_str(), "login_failure");
        assert_eq!(AuditKind::Logout.as_str(), "logout");
        assert_eq!(AuditKind::UnauthorizedAccess.as_str(), "unauthorized_access");
    }

    #[test]
    fn memory_log_records_and_filters() {
        let log = MemoryAuditLog::new();
        log.record(AuditEvent::anonymous(AuditKind::Access, "ip", "one"));
        log.record(AuditEvent::anonymous(
            AuditKind::UnauthorizedAccess,
            "ip",
            "two",
        ));

        assert_eq!(log.events().len(), 2);
        let unauthorized = log.events_of(AuditKind::UnauthorizedAccess);
        assert_eq!(unauthorized.len(), 1);
        assert_eq!(unauthorized[0].detail, "two");
    }
}
