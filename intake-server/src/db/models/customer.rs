//! Customer Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Customer entity
///
/// `loyalty_points` is only ever mutated by the loyalty ledger engine,
/// in the same logical operation as an order creation or update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_address: Option<String>,
    /// Never negative
    #[serde(default)]
    pub loyalty_points: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
