//! Branch Repository

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::Branch;
use crate::orders::shard;
use shared::models::{BranchCreate, BranchUpdate};
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "branch";

#[derive(Clone)]
pub struct BranchRepository {
    base: BaseRepository,
}

impl BranchRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active branches, directory iteration order = creation order
    pub async fn find_all(&self) -> RepoResult<Vec<Branch>> {
        let branches: Vec<Branch> = self
            .base
            .db()
            .query("SELECT * FROM branch WHERE isActive = true ORDER BY createdAt")
            .await?
            .take(0)?;
        Ok(branches)
    }

    /// Find branch by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Branch>> {
        let pure_id = strip_table_prefix(TABLE, id);
        let branch: Option<Branch> = self.base.db().select((TABLE, pure_id)).await?;
        Ok(branch)
    }

    /// Find active branch by name (case-insensitive)
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Branch>> {
        let needle = name.trim().to_lowercase();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM branch WHERE isActive = true AND string::lowercase(name) = $name")
            .bind(("name", needle))
            .await?;
        let branches: Vec<Branch> = result.take(0)?;
        Ok(branches.into_iter().next())
    }

    /// Distinct active branch cities, first-seen order preserved
    pub async fn distinct_cities(&self) -> RepoResult<Vec<String>> {
        let mut result = self
            .base
            .db()
            .query("SELECT VALUE city FROM branch WHERE isActive = true ORDER BY createdAt")
            .await?;
        let cities: Vec<String> = result.take(0)?;
        let mut seen = std::collections::HashSet::new();
        Ok(cities
            .into_iter()
            .filter(|c| seen.insert(shard::normalize_city(c)))
            .collect())
    }

    /// Create a new branch
    pub async fn create(&self, data: BranchCreate) -> RepoResult<Branch> {
        if data.city.trim().is_empty() {
            return Err(RepoError::Validation("city is required".to_string()));
        }
        // Check duplicate name
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Branch '{}' already exists",
                data.name
            )));
        }

        let now = now_millis();
        let branch = Branch {
            id: None,
            slug: shard::normalize_city(&data.city),
            name: data.name,
            city: data.city,
            street: data.street,
            postal_code: data.postal_code,
            coordinates: data.coordinates,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let created: Option<Branch> = self.base.db().create(TABLE).content(branch).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create branch".to_string()))
    }

    /// Update a branch; `slug` follows `city` and cannot be set directly
    pub async fn update(&self, id: &str, data: BranchUpdate) -> RepoResult<Branch> {
        let pure_id = strip_table_prefix(TABLE, id);
        if self.find_by_id(pure_id).await?.is_none() {
            return Err(RepoError::NotFound(format!("Branch {} not found", id)));
        }

        if let Some(city) = &data.city
            && city.trim().is_empty()
        {
            return Err(RepoError::Validation("city must not be empty".to_string()));
        }

        let mut patch = serde_json::to_value(&data)
            .map_err(|e| RepoError::Database(e.to_string()))?;
        if let Some(map) = patch.as_object_mut() {
            if let Some(city) = &data.city {
                map.insert("slug".to_string(), shard::normalize_city(city).into());
            }
            map.insert("updatedAt".to_string(), now_millis().into());
        }

        let updated: Option<Branch> = self
            .base
            .db()
            .update((TABLE, pure_id))
            .merge(patch)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Branch {} not found", id)))
    }

    /// Soft delete. Partitions already created for this city stay as they are.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let pure_id = strip_table_prefix(TABLE, id);
        match self.find_by_id(pure_id).await? {
            None => Ok(false),
            Some(branch) if !branch.is_active => Ok(false),
            Some(_) => {
                let patch = serde_json::json!({
                    "isActive": false,
                    "updatedAt": now_millis(),
                });
                let _: Option<Branch> = self
                    .base
                    .db()
                    .update((TABLE, pure_id))
                    .merge(patch)
                    .await?;
                Ok(true)
            }
        }
    }
}
