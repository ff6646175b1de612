//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::models::OrderRecord;
use crate::db::repository::OrderListFilter;
use crate::orders::Caller;
use crate::utils::{AppError, AppResult};
use shared::models::order::{OrderCreateRequest, OrderStatus, OrderUpdateRequest};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    #[serde(rename = "customerId")]
    pub customer_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Create an order
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OrderCreateRequest>,
) -> AppResult<Json<OrderRecord>> {
    let order = state.orders.create_order(payload).await?;
    Ok(Json(order))
}

/// List orders across all partitions, newest first
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderRecord>>> {
    let filter = OrderListFilter {
        status: query.status,
        customer_id: query.customer_id,
    };
    let orders = state.aggregator.list_all(&filter, Some(query.limit)).await?;
    Ok(Json(orders))
}

/// Get order by record id or global "ORD-…" identifier
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<OrderRecord>> {
    let order = if id.starts_with("ORD-") {
        state.aggregator.find_by_order_id(&id).await?
    } else {
        state.aggregator.find_by_id(&id).await?
    };
    order
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))
}

/// Update an order (owning customer or administrator)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<OrderUpdateRequest>,
) -> AppResult<Json<OrderRecord>> {
    let caller = caller_from_headers(&headers);
    let order = state.orders.update_order(&id, payload, &caller).await?;
    Ok(Json(order))
}

/// Caller identity from trusted gateway headers. Session issuance and
/// verification happen upstream of this service.
fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let customer_id = headers
        .get("x-customer-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let is_admin = headers
        .get("x-admin")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));
    Caller {
        customer_id,
        is_admin,
    }
}
