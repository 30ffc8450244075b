//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: authorization and storage calls per operation
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: JSON and query extractors that reject through `errors.rs`

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use storefront_infra::Storage;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(jwt_secret: String, storage: Arc<dyn Storage>) -> Router {
    let jwt = Arc::new(storefront_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::AppServices::new(storage));

    // Every route below sees a `Caller`, anonymous when no token was sent.
    let api = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(ServiceBuilder::new())
}
