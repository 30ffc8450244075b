use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use storefront_auth::Caller;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<Caller>) -> impl IntoResponse {
    Json(serde_json::json!({
        "authenticated": caller.is_authenticated(),
        "user_id": caller.user_id().map(|id| id.to_string()),
        "roles": caller.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "is_admin": caller.is_admin(),
    }))
}
