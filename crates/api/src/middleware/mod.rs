//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac`] -- One extractor per [`inventory_core::access::Capability`].

pub mod auth;
pub mod rbac;
