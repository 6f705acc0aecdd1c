//! Error types for the authentication flow.
//!
//! Both variants are recoverable: the gateway surfaces them to the user as
//! a redirect back to `/login` and to operators through the audit trail.
//! Unauthorized access to a protected route is deliberately *not* an error
//! here; it is a normal control-flow branch that starts a fresh login.

use std::fmt;

/// Failures that abort an OIDC login flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthFlowError {
    /// The identity provider echoed an error back on the callback: the
    /// provider refused, or the user declined consent.
    Provider {
        /// The provider's error code (e.g. `access_denied`).
        code: String,
        /// Human-readable description, when supplied.
        description: String,
    },
    /// The authorization-code exchange itself failed: network fault,
    /// protocol error, or misconfiguration.
    Exchange {
        /// Raw error text, for operators.
        reason: String,
    },
}

impl AuthFlowError {
    /// The error code appended to the login redirect, mirroring what the
    /// login page expects to display.
    #[must_use]
    pub fn login_error_code(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "auth0_error",
            Self::Exchange { .. } => "authentication_failed",
        }
    }
}

impl fmt::Display for AuthFlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { code, description } => {
                write!(f, "provider error '{code}': {description}")
            }
            Self::Exchange { reason } => {
                write!(f, "token exchange failed: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthFlowError {}
