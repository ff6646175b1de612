//! Order intake orchestration
//!
//! Control flow for creation: resolve address → locate branch → resolve
//! partition → mint order id → settle loyalty → persist → apply ledger
//! delta. Locator and customer-lookup failures degrade; counter and
//! ledger failures abort.

use std::sync::Arc;

use shared::models::order::{OrderCreateRequest, OrderItem, OrderStatus, OrderUpdateRequest};
use shared::util::now_millis;

use crate::db::models::{Customer, OrderRecord};
use crate::db::repository::{BranchRepository, CustomerRepository, strip_table_prefix};
use crate::utils::{AppError, non_fatal};

use super::address;
use super::aggregate::OrderAggregator;
use super::locator::{BranchLocator, BranchMatch, LocateContext};
use super::loyalty;
use super::sequence::OrderSequence;
use super::shard::ShardRouter;

/// Payment states that leave an order unpaid at creation time — the
/// ledger delta is deferred for these, never for updates.
const UNPAID_MARKERS: [&str; 2] = ["pending", "unpaid"];

/// Identity of the caller, established at the interface boundary.
/// Session plumbing itself lives outside this service.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub customer_id: Option<String>,
    pub is_admin: bool,
}

pub struct OrderService {
    router: ShardRouter,
    sequence: OrderSequence,
    locator: Arc<BranchLocator>,
    branches: BranchRepository,
    customers: CustomerRepository,
    aggregator: OrderAggregator,
}

impl OrderService {
    pub fn new(
        router: ShardRouter,
        sequence: OrderSequence,
        locator: Arc<BranchLocator>,
        branches: BranchRepository,
        customers: CustomerRepository,
        aggregator: OrderAggregator,
    ) -> Self {
        Self {
            router,
            sequence,
            locator,
            branches,
            customers,
            aggregator,
        }
    }

    /// Create an order end to end.
    pub async fn create_order(&self, req: OrderCreateRequest) -> Result<OrderRecord, AppError> {
        // ── Validation: reject before any side effect ───────────────
        let customer_id = req
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("customerId is required".to_string()))?
            .to_string();
        let items = req
            .items
            .clone()
            .filter(|items| !items.is_empty())
            .ok_or_else(|| AppError::Validation("items must not be empty".to_string()))?;
        validate_items(&items)?;
        let declared_total = req
            .total
            .ok_or_else(|| AppError::Validation("total is required".to_string()))?;
        if !declared_total.is_finite() || declared_total < 0.0 {
            return Err(AppError::Validation(
                "total must be a non-negative number".to_string(),
            ));
        }

        // ── Customer lookup: degraded, never blocking ───────────────
        let customer = non_fatal("load customer", self.customers.find_by_id(&customer_id))
            .await
            .flatten();
        if customer.is_none() {
            tracing::warn!(target: "orders", customer_id = %customer_id, "customer not found, settling without loyalty balance");
        }

        // ── Address resolution ──────────────────────────────────────
        let effective_address = match (&req.address, &req.city) {
            // nothing usable on the request: fall back to the profile
            (None, None) => customer.as_ref().and_then(|c| c.saved_address.clone()),
            _ => req.address.clone(),
        };
        let parsed = effective_address
            .as_deref()
            .map(address::parse)
            .unwrap_or_default();
        let city = req.city.clone().unwrap_or(parsed.city);
        let postal_code = req.postal_code.clone().unwrap_or(parsed.postal_code);

        // ── Branch location: explicit identity, else strategy chain ─
        let directory = non_fatal("load branch directory", self.branches.find_all())
            .await
            .unwrap_or_default();
        let resolved = match &req.branch {
            Some(name) => non_fatal("load branch", self.branches.find_by_name(name))
                .await
                .flatten()
                .map(|b| BranchMatch::from(&b)),
            None => {
                let ctx = LocateContext {
                    coordinates: req.coordinates,
                    city: &city,
                    branches: &directory,
                };
                self.locator.locate(&ctx).await
            }
        };
        let branch_city = resolved
            .as_ref()
            .map(|m| m.city.clone())
            .unwrap_or_default();

        // ── Partition + global identifier ───────────────────────────
        let partition = self.router.partition_for(&branch_city);
        let order_id = self.sequence.next().await?;

        // ── Loyalty settlement ──────────────────────────────────────
        let balance = customer.as_ref().map(|c| c.loyalty_points).unwrap_or(0);
        let requested_points = req.points_used.unwrap_or(0);
        let settlement = loyalty::settle(&items, declared_total, requested_points, balance);

        let now = now_millis();
        let record = OrderRecord {
            id: None,
            order_id,
            customer_id: customer_id.clone(),
            items,
            subtotal: settlement.subtotal,
            detected_tax: settlement.detected_tax,
            total: settlement.total,
            points_used: settlement.points_used,
            points_earned: settlement.points_earned,
            status: OrderStatus::Pending,
            payment_method: req.payment_method.clone(),
            address: effective_address.clone().unwrap_or_default(),
            city,
            postal_code,
            customer_coords: req.coordinates,
            branch_coords: resolved.as_ref().and_then(|m| m.coordinates),
            branch_name: resolved.as_ref().map(|m| m.name.clone()),
            order_type: req.order_type.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = partition.create(record).await?;
        tracing::info!(
            target: "orders",
            order_id = %created.order_id,
            partition = partition.table(),
            branch = created.branch_name.as_deref().unwrap_or("-"),
            "order created"
        );

        // ── Ledger delta: skipped while the order is left unpaid ────
        if let Some(customer) = &customer {
            if is_unpaid(req.payment_method.as_deref()) {
                tracing::debug!(target: "orders", order_id = %created.order_id, "order unpaid at creation, deferring ledger delta");
            } else {
                self.apply_ledger_delta(customer, &settlement).await?;
            }

            // Remember a fresh delivery address on the profile
            self.remember_address(customer, effective_address.as_deref())
                .await;
        }

        Ok(created)
    }

    /// Update an order in place: any subset of fields, re-settled through
    /// the ledger. The delta always applies on updates.
    pub async fn update_order(
        &self,
        id: &str,
        req: OrderUpdateRequest,
        caller: &Caller,
    ) -> Result<OrderRecord, AppError> {
        if req.is_empty() {
            return Err(AppError::Validation("no fields to update".to_string()));
        }

        let located = if id.starts_with("ORD-") {
            self.aggregator.locate_by_order_id(id).await?
        } else {
            self.aggregator.locate_by_id(id).await?
        };
        let (store, mut record) =
            located.ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        authorize(caller, &record.customer_id)?;

        if let Some(items) = req.items {
            validate_items(&items)?;
            record.items = items;
        }
        if let Some(payment_method) = req.payment_method {
            record.payment_method = Some(payment_method);
        }
        if let Some(status) = req.status {
            record.status = status;
        }
        if let Some(raw) = req.address {
            let parsed = address::parse(&raw);
            record.city = parsed.city;
            record.postal_code = parsed.postal_code;
            record.address = raw;
        }

        let declared_total = match req.total {
            Some(total) if !total.is_finite() || total < 0.0 => {
                return Err(AppError::Validation(
                    "total must be a non-negative number".to_string(),
                ));
            }
            Some(total) => total,
            None => record.total,
        };

        let customer = non_fatal("load customer", self.customers.find_by_id(&record.customer_id))
            .await
            .flatten();
        let balance = customer.as_ref().map(|c| c.loyalty_points).unwrap_or(0);
        let requested_points = req.points_used.unwrap_or(record.points_used);
        let settlement =
            loyalty::settle(&record.items, declared_total, requested_points, balance);

        record.subtotal = settlement.subtotal;
        record.detected_tax = settlement.detected_tax;
        record.total = settlement.total;
        record.points_used = settlement.points_used;
        record.points_earned = settlement.points_earned;
        record.updated_at = now_millis();

        let record_key = record
            .id
            .as_ref()
            .map(|id| id.key().to_string())
            .ok_or_else(|| AppError::Internal("order record has no id".to_string()))?;
        let updated = store.update(&record_key, record).await?;

        if let Some(customer) = &customer {
            self.apply_ledger_delta(customer, &settlement).await?;
        }

        Ok(updated)
    }

    /// Balance write for a settlement. Failure aborts the operation —
    /// surfaced as a server error, never retried here.
    async fn apply_ledger_delta(
        &self,
        customer: &Customer,
        settlement: &loyalty::Settlement,
    ) -> Result<(), AppError> {
        let Some(id) = customer.id.as_ref() else {
            return Ok(());
        };
        self.customers
            .apply_points_delta(
                &id.key().to_string(),
                settlement.points_used,
                settlement.points_earned,
            )
            .await?;
        Ok(())
    }

    /// Best-effort: keep the customer's saved address current when an
    /// order ships to a different one.
    async fn remember_address(&self, customer: &Customer, address: Option<&str>) {
        let Some(address) = address.filter(|a| !a.trim().is_empty()) else {
            return;
        };
        let saved = customer.saved_address.as_deref().unwrap_or("");
        if address::normalize(saved) == address::normalize(address) {
            return;
        }
        let Some(id) = customer.id.as_ref() else {
            return;
        };
        let update = shared::models::CustomerUpdate {
            saved_address: Some(address.to_string()),
            ..Default::default()
        };
        non_fatal(
            "remember delivery address",
            self.customers.update(&id.key().to_string(), update),
        )
        .await;
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), AppError> {
    for (index, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "items[{index}].name must not be empty"
            )));
        }
        if item.quantity < 1 {
            return Err(AppError::Validation(format!(
                "items[{index}].quantity must be at least 1"
            )));
        }
        if !item.price.is_finite() || item.price < 0.0 {
            return Err(AppError::Validation(format!(
                "items[{index}].price must be a non-negative number"
            )));
        }
    }
    Ok(())
}

fn is_unpaid(payment_method: Option<&str>) -> bool {
    match payment_method {
        None => true,
        Some(method) => {
            let method = method.trim().to_lowercase();
            method.is_empty() || UNPAID_MARKERS.contains(&method.as_str())
        }
    }
}

fn authorize(caller: &Caller, owner_id: &str) -> Result<(), AppError> {
    if caller.is_admin {
        return Ok(());
    }
    let owner = strip_table_prefix("customer", owner_id);
    match caller.customer_id.as_deref() {
        Some(caller_id) if strip_table_prefix("customer", caller_id) == owner => Ok(()),
        _ => Err(AppError::Forbidden(
            "only the owning customer or an administrator may update this order".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_payment_method_counts_as_unpaid() {
        assert!(is_unpaid(None));
        assert!(is_unpaid(Some("  ")));
        assert!(is_unpaid(Some("Pending")));
        assert!(is_unpaid(Some("unpaid")));
        assert!(!is_unpaid(Some("card")));
        assert!(!is_unpaid(Some("cash")));
    }

    #[test]
    fn owner_and_admin_pass_authorization() {
        let admin = Caller {
            customer_id: None,
            is_admin: true,
        };
        assert!(authorize(&admin, "customer:abc").is_ok());

        let owner = Caller {
            customer_id: Some("abc".to_string()),
            is_admin: false,
        };
        assert!(authorize(&owner, "customer:abc").is_ok());

        let stranger = Caller {
            customer_id: Some("xyz".to_string()),
            is_admin: false,
        };
        assert!(authorize(&stranger, "customer:abc").is_err());

        let anonymous = Caller::default();
        assert!(authorize(&anonymous, "customer:abc").is_err());
    }
}
