use axum::{routing::get, Router};

pub mod orders;
pub mod products;
pub mod reviews;
pub mod system;

/// Router for every endpoint that runs behind the caller middleware.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/reviews", reviews::router())
        .nest("/orders", orders::router())
}
