//! `storefront-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! turn a bearer token into a [`Caller`] and how to decide whether that caller
//! may perform an [`Action`] on a [`Resource`].

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AccessDenied, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use policy::{Action, Capability, Resource, required_capabilities};
pub use principal::Caller;
pub use roles::Role;
