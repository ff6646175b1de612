//! Order payloads and enums
//!
//! Wire format is camelCase to match the public API; storage documents
//! use the same shape so a persisted order round-trips unchanged.

use crate::types::Coordinates;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// How the order is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderType {
    Pickup,
    HomeDelivery,
}

impl Default for OrderType {
    fn default() -> Self {
        Self::Pickup
    }
}

/// Single item line on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    /// Must be >= 1
    pub quantity: i32,
    /// Unit price, must be >= 0
    pub price: f64,
}

/// Inbound order-creation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateRequest {
    pub customer_id: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    /// Caller-declared total; the part above the item subtotal is kept
    /// as opaque tax, never recomputed.
    pub total: Option<f64>,
    pub payment_method: Option<String>,
    /// Free-text address, parsed into street/city/postal code
    pub address: Option<String>,
    /// Explicit city, overrides whatever the free-text parse finds
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Requested redemption, clamped and floored to a multiple of 100
    pub points_used: Option<i64>,
    /// Explicit serving branch, bypasses the locator chain
    pub branch: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub order_type: Option<OrderType>,
}

/// Inbound order-update request (any subset of fields)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdateRequest {
    pub items: Option<Vec<OrderItem>>,
    pub total: Option<f64>,
    pub points_used: Option<i64>,
    pub payment_method: Option<String>,
    pub address: Option<String>,
    pub status: Option<OrderStatus>,
}

impl OrderUpdateRequest {
    /// True when nothing at all was supplied
    pub fn is_empty(&self) -> bool {
        self.items.is_none()
            && self.total.is_none()
            && self.points_used.is_none()
            && self.payment_method.is_none()
            && self.address.is_none()
            && self.status.is_none()
    }
}
