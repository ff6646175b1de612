//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型
//! - [`AppResponse`] - API 响应结构
//! - 日志、校验等工具

pub mod error;
pub mod logger;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult};
pub use error::{ok, ok_with_message};

use std::fmt::Display;
use std::future::Future;

/// Run a best-effort side effect: log the failure and keep going.
///
/// Operations whose failure must abort the caller use `?` as usual;
/// anything routed through here is visibly non-fatal.
pub async fn non_fatal<T, E, F>(op: &'static str, fut: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(target: "non_fatal", operation = op, error = %e, "non-fatal operation failed, continuing");
            None
        }
    }
}
