use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use storefront_auth::{Action, Caller};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/:id",
            get(get_review)
                .put(replace_review)
                .patch(patch_review)
                .delete(delete_review),
        )
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<impl IntoResponse> {
    let reviews = services.list_reviews(&caller).await?;
    Ok(Json(
        reviews
            .iter()
            .map(dto::ReviewResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<dto::CreateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let review = services
        .create_review(&caller, &body.product_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(dto::ReviewResponse::from(&review))))
}

pub async fn get_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let review = services.get_review(&caller, &id).await?;
    Ok(Json(dto::ReviewResponse::from(&review)))
}

pub async fn replace_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let review = services
        .update_review(&caller, Action::Update, &id, Some(body.content))
        .await?;
    Ok(Json(dto::ReviewResponse::from(&review)))
}

pub async fn patch_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::PatchReviewRequest>,
) -> ApiResult<impl IntoResponse> {
    let review = services
        .update_review(&caller, Action::PartialUpdate, &id, body.content)
        .await?;
    Ok(Json(dto::ReviewResponse::from(&review)))
}

pub async fn delete_review(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    services.delete_review(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
