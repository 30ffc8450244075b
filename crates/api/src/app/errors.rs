use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use storefront_auth::AccessDenied;
use storefront_core::DomainError;
use storefront_infra::StoreError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Access(#[from] AccessDenied),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Access(denied @ AccessDenied::Unauthenticated { .. }) => {
                json_error(StatusCode::UNAUTHORIZED, "unauthenticated", denied.to_string())
            }
            ApiError::Access(denied @ AccessDenied::PermissionDenied { .. }) => {
                json_error(StatusCode::FORBIDDEN, "forbidden", denied.to_string())
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Body(rejection) => {
                json_error(rejection.status(), "invalid_body", rejection.body_text())
            }
            ApiError::Query(rejection) => {
                json_error(rejection.status(), "invalid_query", rejection.body_text())
            }
        }
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
    }
}

fn store_error_to_response(err: StoreError) -> Response {
    let message = err.to_string();
    match err {
        StoreError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StoreError::IntegrityViolation(_) => {
            json_error(StatusCode::CONFLICT, "integrity_violation", message)
        }
        StoreError::Duplicate(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        StoreError::Backend { .. } => {
            tracing::error!(error = %message, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "internal storage error",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_auth::{Action, Capability, Resource};

    #[test]
    fn access_verdicts_map_to_401_and_403() {
        let unauthenticated = ApiError::from(AccessDenied::Unauthenticated {
            resource: Resource::Review,
            action: Action::Create,
        });
        assert_eq!(unauthenticated.into_response().status(), StatusCode::UNAUTHORIZED);

        let forbidden = ApiError::from(AccessDenied::PermissionDenied {
            resource: Resource::Product,
            action: Action::Create,
            missing: Capability::Administrator,
        });
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn store_and_domain_errors_map_to_client_statuses() {
        let cases = [
            (ApiError::from(StoreError::NotFound("product")), StatusCode::NOT_FOUND),
            (
                ApiError::from(StoreError::IntegrityViolation("ordered".into())),
                StatusCode::CONFLICT,
            ),
            (ApiError::from(DomainError::validation("bad")), StatusCode::BAD_REQUEST),
            (ApiError::from(DomainError::invalid_id("x")), StatusCode::BAD_REQUEST),
            (
                ApiError::from(StoreError::backend("op", "boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn query_rejections_render_as_json_errors() {
        use axum::extract::{FromRequestParts, Query};

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/products?price_from=abc")
            .body(())
            .unwrap()
            .into_parts();
        let rejection = Query::<crate::app::dto::ProductListParams>::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();

        let response = ApiError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_query");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }
}
