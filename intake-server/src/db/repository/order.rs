//! Per-partition order store
//!
//! One handle per partition table ("Order", "OrderTofino", ...). The
//! table itself is created lazily by SurrealDB on first write, so
//! provisioning a partition is nothing more than constructing a handle —
//! repeating it is harmless.

use super::{RepoError, RepoResult, strip_table_prefix};
use crate::db::models::OrderRecord;
use shared::models::order::OrderStatus;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// Store-level list filter
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
}

/// Handle to a single order partition
#[derive(Clone)]
pub struct OrderStore {
    db: Surreal<Db>,
    table: String,
}

impl OrderStore {
    pub fn new(db: Surreal<Db>, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// Partition (table) name this handle writes to
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Persist a new order into this partition
    pub async fn create(&self, record: OrderRecord) -> RepoResult<OrderRecord> {
        let created: Option<OrderRecord> =
            self.db.create(self.table.as_str()).content(record).await?;
        created.ok_or_else(|| {
            RepoError::Database(format!("Failed to create order in {}", self.table))
        })
    }

    /// Find by record id within this partition
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrderRecord>> {
        let pure_id = strip_table_prefix(&self.table, id);
        let order: Option<OrderRecord> =
            self.db.select((self.table.as_str(), pure_id)).await?;
        Ok(order)
    }

    /// Find by global order identifier ("ORD-00042") within this partition
    pub async fn find_by_order_id(&self, order_id: &str) -> RepoResult<Option<OrderRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::table($tb) WHERE orderId = $order_id")
            .bind(("tb", self.table.clone()))
            .bind(("order_id", order_id.to_string()))
            .await?;
        let orders: Vec<OrderRecord> = result.take(0)?;
        Ok(orders.into_iter().next())
    }

    /// List orders in this partition, newest first
    pub async fn list(&self, filter: &OrderListFilter) -> RepoResult<Vec<OrderRecord>> {
        let mut sql = String::from("SELECT * FROM type::table($tb)");
        let mut clauses: Vec<&str> = Vec::new();
        if filter.status.is_some() {
            clauses.push("status = $status");
        }
        if filter.customer_id.is_some() {
            clauses.push("customerId = $customer_id");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY createdAt DESC");

        let mut query = self.db.query(sql).bind(("tb", self.table.clone()));
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        if let Some(customer_id) = filter.customer_id.clone() {
            query = query.bind(("customer_id", customer_id));
        }

        let orders: Vec<OrderRecord> = query.await?.take(0)?;
        Ok(orders)
    }

    /// Write an order document back in place (same partition, same
    /// record id — orders never move between partitions).
    pub async fn update(&self, id: &str, record: OrderRecord) -> RepoResult<OrderRecord> {
        let pure_id = strip_table_prefix(&self.table, id);
        let mut patch = serde_json::to_value(&record)
            .map_err(|e| RepoError::Database(e.to_string()))?;
        if let Some(map) = patch.as_object_mut() {
            // the id field is immutable, never part of the patch
            map.remove("id");
        }
        let updated: Option<OrderRecord> = self
            .db
            .update((self.table.as_str(), pure_id))
            .merge(patch)
            .await?;
        updated.ok_or_else(|| {
            RepoError::NotFound(format!("Order {} not found in {}", id, self.table))
        })
    }
}
