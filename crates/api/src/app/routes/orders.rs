use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use storefront_auth::Caller;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<impl IntoResponse> {
    let orders = services.list_orders(&caller).await?;
    Ok(Json(
        orders
            .iter()
            .map(dto::OrderResponse::from)
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    ApiJson(body): ApiJson<dto::CreateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let lines: Vec<(&str, i64)> = body
        .items
        .iter()
        .map(|line| (line.product_id.as_str(), line.quantity))
        .collect();
    let order = services.create_order(&caller, &lines).await?;
    Ok((StatusCode::CREATED, Json(dto::OrderResponse::from(&order))))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let order = services.get_order(&caller, &id).await?;
    Ok(Json(dto::OrderResponse::from(&order)))
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::UpdateOrderRequest>,
) -> ApiResult<impl IntoResponse> {
    let order = services
        .update_order_status(&caller, &id, &body.status)
        .await?;
    Ok(Json(dto::OrderResponse::from(&order)))
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    services.delete_order(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
