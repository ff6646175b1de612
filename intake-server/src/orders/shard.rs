//! Shard Router
//!
//! Maps a branch city to its order partition and hands out memoized
//! partition handles.
//!
//! # 分区命名
//!
//! | 输入 | 规范化 | 分区表 |
//! |------|--------|--------|
//! | "Campbell River" | CampbellRiver | OrderCampbellRiver |
//! | "campbell-river" | CampbellRiver | OrderCampbellRiver |
//! | "" (no branch)   | —             | Order (default)    |
//!
//! Handles are memoized per normalized name: repeated calls for the same
//! city return the same handle. The partition list itself is recomputed
//! on every `all_partitions` call — it grows as branches are added.

use crate::db::repository::{BranchRepository, OrderStore, RepoResult};
use dashmap::DashMap;
use std::sync::Arc;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

/// The default (unsharded) partition, used when no branch city resolves
pub const DEFAULT_PARTITION: &str = "Order";

/// Normalize a raw city string into the partition token.
///
/// Every non-alphanumeric character becomes a separator, each token is
/// title-cased, the tokens are concatenated. All input formattings of
/// one city collapse to one token sequence.
pub fn normalize_city(raw: &str) -> String {
    let separated: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    separated
        .split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Partition (table) name for a raw city. Empty input maps to the
/// default partition.
pub fn partition_name(city_raw: &str) -> String {
    format!("{DEFAULT_PARTITION}{}", normalize_city(city_raw))
}

/// Registry of per-partition order stores.
///
/// Handle construction is cheap but callers treat provisioning as
/// non-idempotent-cheap, so the registry guarantees one handle per
/// normalized name via a concurrent lookup-or-create.
#[derive(Clone)]
pub struct ShardRouter {
    db: Surreal<Db>,
    handles: Arc<DashMap<String, OrderStore>>,
}

impl ShardRouter {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            db,
            handles: Arc::new(DashMap::new()),
        }
    }

    /// Resolve (and lazily provision) the partition for a raw city.
    /// The same city always maps to the same partition, whatever the
    /// input formatting.
    pub fn partition_for(&self, city_raw: &str) -> OrderStore {
        let table = partition_name(city_raw);
        self.handles
            .entry(table.clone())
            .or_insert_with(|| OrderStore::new(self.db.clone(), table))
            .clone()
    }

    /// The default partition handle
    pub fn default_partition(&self) -> OrderStore {
        self.partition_for("")
    }

    /// Enumerate the default partition plus one partition per distinct
    /// active branch city. Recomputed per call — never cached, since the
    /// directory changes as branches are added.
    pub async fn all_partitions(
        &self,
        branches: &BranchRepository,
    ) -> RepoResult<Vec<OrderStore>> {
        let mut partitions = vec![self.default_partition()];
        for city in branches.distinct_cities().await? {
            partitions.push(self.partition_for(&city));
        }
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formattings_of_one_city_normalize_identically() {
        let expected = "CampbellRiver";
        for raw in ["Campbell River", "campbell-river", "CAMPBELL   RIVER", "Campbell  River!"] {
            assert_eq!(normalize_city(raw), expected, "input: {raw:?}");
        }
    }

    #[test]
    fn partition_name_prefixes_default() {
        assert_eq!(partition_name("Tofino"), "OrderTofino");
        assert_eq!(partition_name("campbell river"), "OrderCampbellRiver");
    }

    #[test]
    fn empty_city_maps_to_default_partition() {
        assert_eq!(partition_name(""), DEFAULT_PARTITION);
        assert_eq!(partition_name("  ?!  "), DEFAULT_PARTITION);
    }

    #[test]
    fn numbers_survive_normalization() {
        assert_eq!(normalize_city("100 mile house"), "100MileHouse");
    }
}
