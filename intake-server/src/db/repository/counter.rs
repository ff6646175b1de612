//! Order Counter Repository
//!
//! A single global record, `counter:global`, is the only piece of
//! cross-partition coordination in the whole system. The increment is a
//! one-statement upsert so the storage engine serializes racing callers;
//! a failed increment leaves a gap, never a duplicate.

use super::{BaseRepository, RepoError, RepoResult};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "counter";
const GLOBAL_ID: &str = "global";

/// Counter document. `last_number` only ever increases.
#[derive(Debug, Serialize, Deserialize)]
struct OrderCounter {
    last_number: u64,
}

#[derive(Clone)]
pub struct CounterRepository {
    base: BaseRepository,
}

impl CounterRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Atomically increment and read the global counter.
    /// Creates the record on first use, starting from 0.
    pub async fn increment(&self) -> RepoResult<u64> {
        let mut result = self
            .base
            .db()
            .query("UPSERT type::thing($tb, $id) SET last_number += 1 RETURN AFTER")
            .bind(("tb", TABLE))
            .bind(("id", GLOBAL_ID))
            .await?;
        let counter: Option<OrderCounter> = result.take(0)?;
        counter
            .map(|c| c.last_number)
            .ok_or_else(|| RepoError::Database("Counter increment returned no record".to_string()))
    }
}
