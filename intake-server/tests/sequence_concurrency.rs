//! Concurrent callers must never mint the same order identifier.
//! Run: cargo test -p intake-server --test sequence_concurrency

use intake_server::db::DbService;
use intake_server::orders::OrderSequence;
use std::collections::HashSet;

#[tokio::test]
async fn concurrent_increments_yield_pairwise_distinct_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let db = DbService::new(&tmp.path().join("intake.db")).await.unwrap().db;
    let sequence = OrderSequence::new(db);

    const CALLERS: usize = 16;
    let mut handles = Vec::with_capacity(CALLERS);
    for _ in 0..CALLERS {
        let sequence = sequence.clone();
        handles.push(tokio::spawn(async move { sequence.next().await.unwrap() }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap();
        assert!(id.starts_with("ORD-"), "unexpected format: {id}");
        assert!(ids.insert(id.clone()), "duplicate identifier {id}");
    }
    assert_eq!(ids.len(), CALLERS);
}

#[tokio::test]
async fn numbers_are_strictly_increasing_within_one_caller() {
    let tmp = tempfile::tempdir().unwrap();
    let db = DbService::new(&tmp.path().join("intake.db")).await.unwrap().db;
    let sequence = OrderSequence::new(db);

    let mut last = 0u64;
    for _ in 0..5 {
        let id = sequence.next().await.unwrap();
        let number: u64 = id.trim_start_matches("ORD-").parse().unwrap();
        assert!(number > last, "{number} did not advance past {last}");
        last = number;
    }
    assert_eq!(last, 5);
}
