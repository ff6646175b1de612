//! Customer Repository

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::Customer;
use shared::models::{CustomerCreate, CustomerUpdate};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "customer";

#[derive(Clone)]
pub struct CustomerRepository {
    base: BaseRepository,
}

impl CustomerRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active customers
    pub async fn find_all(&self) -> RepoResult<Vec<Customer>> {
        let customers: Vec<Customer> = self
            .base
            .db()
            .query("SELECT * FROM customer WHERE isActive = true ORDER BY createdAt DESC")
            .await?
            .take(0)?;
        Ok(customers)
    }

    /// Find customer by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Customer>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let customer: Option<Customer> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(customer)
    }

    /// Create a new customer, starting with an empty loyalty balance
    pub async fn create(&self, data: CustomerCreate) -> RepoResult<Customer> {
        let now = now_millis();
        let customer = Customer {
            id: None,
            name: data.name,
            phone: data.phone,
            email: data.email,
            saved_address: data.saved_address,
            loyalty_points: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Customer> = self.base.db().create(TABLE).content(customer).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create customer".to_string()))
    }

    /// Update profile fields. The loyalty balance is not touchable here.
    pub async fn update(&self, id: &str, data: CustomerUpdate) -> RepoResult<Customer> {
        let pure_id = strip_table_prefix(TABLE, id);
        if self.find_by_id(pure_id).await?.is_none() {
            return Err(RepoError::NotFound(format!("Customer {} not found", id)));
        }

        let mut patch = serde_json::to_value(&data)
            .map_err(|e| RepoError::Database(e.to_string()))?;
        if let Some(map) = patch.as_object_mut() {
            map.insert("updatedAt".to_string(), now_millis().into());
        }

        let updated: Option<Customer> = self
            .base
            .db()
            .update((TABLE, pure_id))
            .merge(patch)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Customer {} not found", id)))
    }

    /// Apply a loyalty ledger delta in a single statement:
    /// `balance = max(0, balance - used) + earned`.
    ///
    /// The clamp against the pre-read balance happened at settlement time;
    /// two concurrent orders for one customer can both settle against the
    /// same stale read. That window is accepted — see DESIGN.md.
    pub async fn apply_points_delta(
        &self,
        id: &str,
        points_used: i64,
        points_earned: i64,
    ) -> RepoResult<()> {
        let pure_id = strip_table_prefix(TABLE, id).to_string();
        self.base
            .db()
            .query(
                "UPDATE type::thing($tb, $id) SET \
                 loyaltyPoints = math::max([loyaltyPoints - $used, 0]) + $earned, \
                 updatedAt = $now",
            )
            .bind(("tb", TABLE))
            .bind(("id", pure_id))
            .bind(("used", points_used))
            .bind(("earned", points_earned))
            .bind(("now", now_millis()))
            .await?;
        Ok(())
    }
}
