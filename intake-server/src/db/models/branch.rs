//! Branch Model
//!
//! 物理门店。`city` 是分片键：slug 和分区名都是 city 的纯函数。
//! 删除门店不会迁移或删除已为该城市创建的分区。

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::types::Coordinates;
use surrealdb::RecordId;

/// Branch entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    /// Shard key (required)
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Normalized city token, derived — never set by callers
    pub slug: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
