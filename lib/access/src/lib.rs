//! Session, identity, and audit primitives for the gatehouse session gateway.
//!
//! This crate provides:
//! - Session state carried in a client-bound cookie (`Session`)
//! - User identity extracted from OIDC claims (`UserInfo`)
//! - The audit-logging contract (`AuditLog`, `AuditEvent`, `AuditKind`)
//! - Authentication-flow error types (`AuthFlowError`)
//!
//! # Authorization Model
//!
//! The gateway recognizes a request as authorized when the client either
//! presents a session established through the OIDC login flow, or carries a
//! bearer token in the `Authorization` header. Everything else is redirected
//! into a fresh login, remembering the originally requested destination.
//!
//! Every authentication-relevant decision (login attempt, callback result,
//! protected-resource check, logout) records exactly one [`AuditEvent`]
//! before the HTTP response is produced.

pub mod audit;
pub mod error;
pub mod session;
pub mod userinfo;

// Re-export main types at crate root
pub use audit::{AuditEvent, AuditKind, AuditLog, MemoryAuditLog, TracingAuditLog};
pub use error::AuthFlowError;
pub use session::Session;
pub use userinfo::{UNKNOWN, UserInfo};
