//! Order Aggregator
//!
//! Orders are sharded by city with no global index, so every read fans
//! out over all known partitions: default + one per distinct branch
//! city. Identifier lookups return on first hit; lists merge and sort by
//! creation time descending. A partition that fails to answer is logged
//! and left out — it never sinks the whole aggregate.

use crate::db::models::OrderRecord;
use crate::db::repository::{BranchRepository, OrderListFilter, OrderStore, RepoResult};
use futures::future::join_all;

use super::shard::ShardRouter;

#[derive(Clone)]
pub struct OrderAggregator {
    router: ShardRouter,
    branches: BranchRepository,
}

/// Merge per-partition list results: failures are dropped (already
/// logged), survivors are flattened and sorted newest-first.
fn merge_partition_lists(
    results: Vec<(String, RepoResult<Vec<OrderRecord>>)>,
) -> Vec<OrderRecord> {
    let mut merged: Vec<OrderRecord> = Vec::new();
    for (partition, result) in results {
        match result {
            Ok(orders) => merged.extend(orders),
            Err(e) => {
                tracing::warn!(target: "aggregate", %partition, error = %e, "partition query failed, omitting from merge");
            }
        }
    }
    merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    merged
}

impl OrderAggregator {
    pub fn new(router: ShardRouter, branches: BranchRepository) -> Self {
        Self { router, branches }
    }

    /// List orders across all partitions, newest first.
    pub async fn list_all(
        &self,
        filter: &OrderListFilter,
        limit: Option<usize>,
    ) -> RepoResult<Vec<OrderRecord>> {
        let partitions = self.router.all_partitions(&self.branches).await?;

        let queries = partitions.iter().map(|store| async {
            (store.table().to_string(), store.list(filter).await)
        });
        let results = join_all(queries).await;

        let mut merged = merge_partition_lists(results);
        if let Some(limit) = limit {
            merged.truncate(limit);
        }
        Ok(merged)
    }

    /// Probe every partition for a record id; first hit wins. Not-found
    /// is only reported once every partition has been checked.
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<OrderRecord>> {
        Ok(self.locate_by_id(id).await?.map(|(_, record)| record))
    }

    /// Probe every partition for a global order identifier ("ORD-…").
    pub async fn find_by_order_id(&self, order_id: &str) -> RepoResult<Option<OrderRecord>> {
        Ok(self
            .locate_by_order_id(order_id)
            .await?
            .map(|(_, record)| record))
    }

    /// As [`find_by_id`], but also hands back the owning partition —
    /// needed by updates, which must write the order back where it lives.
    pub(crate) async fn locate_by_id(
        &self,
        id: &str,
    ) -> RepoResult<Option<(OrderStore, OrderRecord)>> {
        for store in self.router.all_partitions(&self.branches).await? {
            match store.find_by_id(id).await {
                Ok(Some(record)) => return Ok(Some((store, record))),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(target: "aggregate", partition = store.table(), error = %e, "partition probe failed, continuing");
                }
            }
        }
        Ok(None)
    }

    pub(crate) async fn locate_by_order_id(
        &self,
        order_id: &str,
    ) -> RepoResult<Option<(OrderStore, OrderRecord)>> {
        for store in self.router.all_partitions(&self.branches).await? {
            match store.find_by_order_id(order_id).await {
                Ok(Some(record)) => return Ok(Some((store, record))),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(target: "aggregate", partition = store.table(), error = %e, "partition probe failed, continuing");
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::RepoError;
    use shared::models::order::{OrderStatus, OrderType};

    fn record(order_id: &str, created_at: i64) -> OrderRecord {
        OrderRecord {
            id: None,
            order_id: order_id.to_string(),
            customer_id: "customer:1".to_string(),
            items: vec![],
            subtotal: 0.0,
            detected_tax: 0.0,
            total: 0.0,
            points_used: 0,
            points_earned: 0,
            status: OrderStatus::Pending,
            payment_method: None,
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            customer_coords: None,
            branch_coords: None,
            branch_name: None,
            order_type: OrderType::Pickup,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn failing_partition_is_omitted_not_fatal() {
        let results = vec![
            (
                "Order".to_string(),
                Ok(vec![record("ORD-00001", 100), record("ORD-00004", 400)]),
            ),
            (
                "OrderTofino".to_string(),
                Err(RepoError::Database("partition offline".to_string())),
            ),
            (
                "OrderCampbellRiver".to_string(),
                Ok(vec![record("ORD-00003", 300)]),
            ),
        ];

        let merged = merge_partition_lists(results);
        let ids: Vec<&str> = merged.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, ["ORD-00004", "ORD-00003", "ORD-00001"]);
    }

    #[test]
    fn merge_sorts_by_creation_time_descending() {
        let results = vec![
            ("Order".to_string(), Ok(vec![record("ORD-00002", 200)])),
            ("OrderTofino".to_string(), Ok(vec![record("ORD-00005", 500), record("ORD-00001", 100)])),
        ];
        let merged = merge_partition_lists(results);
        let times: Vec<i64> = merged.iter().map(|o| o.created_at).collect();
        assert_eq!(times, [500, 200, 100]);
    }

    #[test]
    fn all_partitions_failing_yields_empty_set() {
        let results = vec![
            ("Order".to_string(), Err(RepoError::Database("a".to_string()))),
            ("OrderTofino".to_string(), Err(RepoError::Database("b".to_string()))),
        ];
        assert!(merge_partition_lists(results).is_empty());
    }
}
