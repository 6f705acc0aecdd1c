//! gatehouse session gateway server.
//!
//! A minimal web front-end that delegates user authentication to an
//! external OpenID Connect identity provider and gates a single protected
//! page behind a signed-cookie session. The interesting part is the
//! authentication state machine in [`gateway`]; everything else is plumbing
//! around the OIDC client in [`provider`].

pub mod config;
pub mod gateway;
pub mod pages;
pub mod provider;
