//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单接入、查询、更新
//! - [`branches`] - 门店目录管理
//! - [`customers`] - 客户档案
//!
//! 每个资源一个子模块：`mod.rs` 声明路由，`handler.rs` 实现处理器。

pub mod branches;
pub mod customers;
pub mod health;
pub mod orders;

use axum::Router;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Request deadline: long enough for a full cross-partition fan-out,
/// well beyond the distance client's own timeout
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(branches::router())
        .merge(customers::router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
