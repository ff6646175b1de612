//! Order Model
//!
//! An order lives in exactly one partition table for its whole life —
//! the one selected at creation time. `order_id` is globally unique
//! across all partitions.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use shared::models::order::{OrderItem, OrderStatus, OrderType};
use shared::types::Coordinates;
use surrealdb::RecordId;

/// Persisted order document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    /// Global identifier, e.g. "ORD-00042". Immutable once assigned.
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    /// max(0, declared total - subtotal); opaque pass-through
    pub detected_tax: f64,
    pub total: f64,
    /// Non-negative multiple of 100
    pub points_used: i64,
    pub points_earned: i64,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_coords: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_coords: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub order_type: OrderType,
    pub created_at: i64,
    pub updated_at: i64,
}
