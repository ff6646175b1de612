//! End-to-end order intake flow against the real embedded engine.
//! Run: cargo test -p intake-server --test order_flow

use std::sync::Arc;

use async_trait::async_trait;
use intake_server::db::DbService;
use intake_server::db::repository::{BranchRepository, CustomerRepository, OrderListFilter};
use intake_server::orders::{
    BranchLocator, Caller, OrderAggregator, OrderSequence, OrderService, ShardRouter,
};
use intake_server::services::{DistanceElement, DistanceError, DistanceProvider};
use shared::models::order::{OrderCreateRequest, OrderItem, OrderStatus, OrderUpdateRequest};
use shared::models::{BranchCreate, CustomerCreate};
use shared::types::Coordinates;

/// Distance provider scripted per test
struct ScriptedProvider {
    result: Result<Vec<DistanceElement>, ()>,
}

#[async_trait]
impl DistanceProvider for ScriptedProvider {
    async fn travel_distances(
        &self,
        _origin: Coordinates,
        _destinations: &[Coordinates],
    ) -> Result<Vec<DistanceElement>, DistanceError> {
        self.result
            .clone()
            .map_err(|_| DistanceError::Upstream("scripted failure".to_string()))
    }
}

struct Harness {
    _tmp: tempfile::TempDir,
    service: OrderService,
    router: ShardRouter,
    branches: BranchRepository,
    customers: CustomerRepository,
    aggregator: OrderAggregator,
}

async fn harness(provider: ScriptedProvider) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let db = DbService::new(&tmp.path().join("intake.db")).await.unwrap().db;

    let router = ShardRouter::new(db.clone());
    let branches = BranchRepository::new(db.clone());
    let customers = CustomerRepository::new(db.clone());
    let aggregator = OrderAggregator::new(router.clone(), branches.clone());
    let locator = Arc::new(BranchLocator::new(Arc::new(provider)));
    let service = OrderService::new(
        router.clone(),
        OrderSequence::new(db.clone()),
        locator,
        branches.clone(),
        customers.clone(),
        aggregator.clone(),
    );

    Harness {
        _tmp: tmp,
        service,
        router,
        branches,
        customers,
        aggregator,
    }
}

fn item(name: &str, quantity: i32, price: f64) -> OrderItem {
    OrderItem {
        name: name.to_string(),
        quantity,
        price,
    }
}

async fn seed_branches(branches: &BranchRepository) {
    // Campbell River carries no coordinates: it can only be reached via
    // the city-text fallback, never the distance ranking
    branches
        .create(BranchCreate {
            name: "Campbell River".to_string(),
            city: "Campbell River".to_string(),
            street: None,
            postal_code: None,
            coordinates: None,
        })
        .await
        .unwrap();
    branches
        .create(BranchCreate {
            name: "Tofino".to_string(),
            city: "Tofino".to_string(),
            street: None,
            postal_code: None,
            coordinates: Some(Coordinates::new(49.15, -125.91)),
        })
        .await
        .unwrap();
}

/// Create a customer and top the balance up to `points`
async fn seed_customer(customers: &CustomerRepository, name: &str, points: i64) -> String {
    let customer = customers
        .create(CustomerCreate {
            name: name.to_string(),
            phone: None,
            email: None,
            saved_address: None,
        })
        .await
        .unwrap();
    let id = customer.id.unwrap().key().to_string();
    if points > 0 {
        customers.apply_points_delta(&id, 0, points).await.unwrap();
    }
    id
}

#[tokio::test]
async fn loyalty_round_trip_lands_in_branch_partition() {
    let h = harness(ScriptedProvider {
        // one element per branch-with-coordinates: Tofino, 4km out
        result: Ok(vec![DistanceElement { ok: true, meters: 4_000 }]),
    })
    .await;
    seed_branches(&h.branches).await;
    let customer_id = seed_customer(&h.customers, "Ada", 500).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id.clone()),
            items: Some(vec![item("Salmon box", 2, 25.0)]),
            total: Some(50.0),
            payment_method: Some("card".to_string()),
            address: Some("123 Oak St, Tofino, V0R 2Z0".to_string()),
            points_used: Some(300),
            coordinates: Some(Coordinates::new(49.2, -125.9)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.order_id, "ORD-00001");
    assert_eq!(created.subtotal, 50.0);
    assert_eq!(created.points_used, 300);
    assert_eq!(created.total, 47.0);
    assert_eq!(created.points_earned, 47);
    assert_eq!(created.city, "Tofino");
    assert_eq!(created.postal_code, "V0R 2Z0");
    assert_eq!(created.address, "123 Oak St, Tofino, V0R 2Z0");
    assert_eq!(created.branch_name.as_deref(), Some("Tofino"));
    assert_eq!(created.status, OrderStatus::Pending);

    // Balance: 500 - 300 + 47
    let customer = h.customers.find_by_id(&customer_id).await.unwrap().unwrap();
    assert_eq!(customer.loyalty_points, 247);

    // The order lives in the Tofino partition, nowhere else
    let partition = h.router.partition_for("Tofino");
    assert_eq!(partition.table(), "OrderTofino");
    let found = partition.find_by_order_id("ORD-00001").await.unwrap();
    assert!(found.is_some());
    let default_hit = h
        .router
        .default_partition()
        .find_by_order_id("ORD-00001")
        .await
        .unwrap();
    assert!(default_hit.is_none());
}

#[tokio::test]
async fn distance_failure_falls_back_to_city_text() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    seed_branches(&h.branches).await;
    let customer_id = seed_customer(&h.customers, "Ben", 0).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id),
            items: Some(vec![item("Coffee", 1, 4.5)]),
            total: Some(4.5),
            payment_method: Some("cash".to_string()),
            city: Some("tofino".to_string()),
            coordinates: Some(Coordinates::new(49.2, -125.9)),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.branch_name.as_deref(), Some("Tofino"));
    let found = h
        .router
        .partition_for("Tofino")
        .find_by_order_id(&created.order_id)
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn unresolved_branch_uses_default_partition() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    seed_branches(&h.branches).await;
    let customer_id = seed_customer(&h.customers, "Cam", 0).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id),
            items: Some(vec![item("Tea", 1, 3.0)]),
            total: Some(3.0),
            payment_method: Some("cash".to_string()),
            city: Some("Winnipeg".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(created.branch_name.is_none());
    let found = h
        .router
        .default_partition()
        .find_by_order_id(&created.order_id)
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn unknown_customer_never_blocks_creation() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    seed_branches(&h.branches).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some("customer:ghost".to_string()),
            items: Some(vec![item("Bread", 2, 6.0)]),
            total: Some(13.2),
            payment_method: Some("card".to_string()),
            points_used: Some(200),
            ..Default::default()
        })
        .await
        .unwrap();

    // Degraded settlement: no redemption, totals from raw subtotal + tax
    assert_eq!(created.points_used, 0);
    assert_eq!(created.subtotal, 12.0);
    assert_eq!(created.detected_tax, 1.2);
    assert_eq!(created.total, 13.2);
    assert_eq!(created.points_earned, 12);
}

#[tokio::test]
async fn unpaid_creation_defers_the_ledger_delta() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    let customer_id = seed_customer(&h.customers, "Dot", 400).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id.clone()),
            items: Some(vec![item("Soup", 1, 12.0)]),
            total: Some(12.0),
            // no payment method: order stays unpaid at creation
            points_used: Some(100),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.points_used, 100);
    let customer = h.customers.find_by_id(&customer_id).await.unwrap().unwrap();
    assert_eq!(customer.loyalty_points, 400);
}

#[tokio::test]
async fn validation_rejects_before_any_side_effect() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    let customer_id = seed_customer(&h.customers, "Eve", 0).await;

    // missing items
    let err = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id.clone()),
            total: Some(10.0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("items"));

    // bad quantity
    let err = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id.clone()),
            items: Some(vec![item("Ghost", 0, 1.0)]),
            total: Some(10.0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("quantity"));

    // missing customer id
    let err = h
        .service
        .create_order(OrderCreateRequest {
            items: Some(vec![item("Thing", 1, 1.0)]),
            total: Some(1.0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("customerId"));

    // a rejected request must not have consumed a sequence number
    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id),
            items: Some(vec![item("Real", 1, 1.0)]),
            total: Some(1.0),
            payment_method: Some("cash".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.order_id, "ORD-00001");
}

#[tokio::test]
async fn update_reauthorizes_and_applies_the_delta() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    seed_branches(&h.branches).await;
    let customer_id = seed_customer(&h.customers, "Fay", 500).await;

    let created = h
        .service
        .create_order(OrderCreateRequest {
            customer_id: Some(customer_id.clone()),
            items: Some(vec![item("Box", 1, 40.0)]),
            total: Some(40.0),
            payment_method: Some("card".to_string()),
            city: Some("Tofino".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    // after creation: 500 - 0 + 40 = 540
    let balance = h
        .customers
        .find_by_id(&customer_id)
        .await
        .unwrap()
        .unwrap()
        .loyalty_points;
    assert_eq!(balance, 540);

    // a stranger cannot touch the order
    let stranger = Caller {
        customer_id: Some("somebody-else".to_string()),
        is_admin: false,
    };
    let err = h
        .service
        .update_order(
            &created.order_id,
            OrderUpdateRequest {
                points_used: Some(100),
                ..Default::default()
            },
            &stranger,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("denied") || err.to_string().contains("Permission"));

    // the owner can, addressed by the global order id
    let owner = Caller {
        customer_id: Some(customer_id.clone()),
        is_admin: false,
    };
    let updated = h
        .service
        .update_order(
            &created.order_id,
            OrderUpdateRequest {
                points_used: Some(100),
                status: Some(OrderStatus::Processing),
                ..Default::default()
            },
            &owner,
        )
        .await
        .unwrap();

    assert_eq!(updated.points_used, 100);
    assert_eq!(updated.total, 39.0);
    assert_eq!(updated.points_earned, 39);
    assert_eq!(updated.status, OrderStatus::Processing);
    assert_eq!(updated.order_id, created.order_id);

    // updates always apply the delta: 540 - 100 + 39
    let balance = h
        .customers
        .find_by_id(&customer_id)
        .await
        .unwrap()
        .unwrap()
        .loyalty_points;
    assert_eq!(balance, 479);
}

#[tokio::test]
async fn aggregator_probes_all_partitions_for_lookups() {
    let h = harness(ScriptedProvider { result: Err(()) }).await;
    seed_branches(&h.branches).await;
    let customer_id = seed_customer(&h.customers, "Gil", 0).await;

    for city in ["Tofino", "Campbell River", "Winnipeg"] {
        h.service
            .create_order(OrderCreateRequest {
                customer_id: Some(customer_id.clone()),
                items: Some(vec![item("Thing", 1, 5.0)]),
                total: Some(5.0),
                payment_method: Some("cash".to_string()),
                city: Some(city.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    // every identifier resolves, wherever it landed
    for order_id in ["ORD-00001", "ORD-00002", "ORD-00003"] {
        let found = h.aggregator.find_by_order_id(order_id).await.unwrap();
        assert!(found.is_some(), "missing {order_id}");
    }
    assert!(
        h.aggregator
            .find_by_order_id("ORD-99999")
            .await
            .unwrap()
            .is_none()
    );

    // the merged list sees all three partitions
    let all = h
        .aggregator
        .list_all(&OrderListFilter::default(), None)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    // newest first
    for pair in all.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    // filtered by customer
    let filtered = h
        .aggregator
        .list_all(
            &OrderListFilter {
                customer_id: Some(customer_id),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 3);
}
