use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use storefront_auth::{Action, Caller};
use storefront_catalog::ProductQuery;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product)
                .put(replace_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route("/:id/reviews", get(product_reviews))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    ApiQuery(params): ApiQuery<dto::ProductListParams>,
) -> ApiResult<impl IntoResponse> {
    let query = ProductQuery::from(params);
    let items = services
        .list_products(&caller, &query)
        .await?
        .iter()
        .map(dto::ProductSummary::from)
        .collect::<Vec<_>>();
    Ok(Json(items))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<dto::WriteProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = services
        .create_product(&caller, body.title, body.description, body.price)
        .await?;
    Ok((StatusCode::CREATED, Json(dto::ProductResponse::from(&product))))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let (product, reviews) = services.get_product(&caller, &id).await?;
    Ok(Json(dto::ProductDetail::new(&product, &reviews)))
}

pub async fn replace_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::WriteProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = services
        .update_product(&caller, Action::Update, &id, body.into())
        .await?;
    Ok(Json(dto::ProductResponse::from(&product)))
}

pub async fn patch_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::PatchProductRequest>,
) -> ApiResult<impl IntoResponse> {
    let product = services
        .update_product(&caller, Action::PartialUpdate, &id, body.into())
        .await?;
    Ok(Json(dto::ProductResponse::from(&product)))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    services.delete_product(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /products/{id}/reviews`: every review of the product, no pagination.
pub async fn product_reviews(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let reviews = services.product_reviews(&caller, &id).await?;
    Ok(Json(
        reviews
            .iter()
            .map(dto::ReviewResponse::from)
            .collect::<Vec<_>>(),
    ))
}
