//! Order Sequence Generator
//!
//! Mints the global order identifier. One atomic increment per order;
//! every partition shares the same counter.

use crate::db::repository::{CounterRepository, RepoResult};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct OrderSequence {
    counters: CounterRepository,
}

impl OrderSequence {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            counters: CounterRepository::new(db),
        }
    }

    /// Next global identifier, e.g. "ORD-00042".
    ///
    /// Values beyond 99999 keep all their digits; only the floor is
    /// padded. A failure here aborts the order — the caller must never
    /// fall back to a guessed number.
    pub async fn next(&self) -> RepoResult<String> {
        let number = self.counters.increment().await?;
        Ok(format!("ORD-{number:05}"))
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn formats_with_five_digit_floor() {
        assert_eq!(format!("ORD-{:05}", 1u64), "ORD-00001");
        assert_eq!(format!("ORD-{:05}", 99999u64), "ORD-99999");
        assert_eq!(format!("ORD-{:05}", 123456u64), "ORD-123456");
    }
}
