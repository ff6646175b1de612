//! Branch API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::Branch;
use crate::db::repository::BranchRepository;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};
use shared::models::{BranchCreate, BranchUpdate};

/// List active branches
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Branch>>> {
    let repo = BranchRepository::new(state.db.clone());
    let branches = repo.find_all().await?;
    Ok(Json(branches))
}

/// Get branch by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Branch>> {
    let repo = BranchRepository::new(state.db.clone());
    let branch = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Branch {} not found", id)))?;
    Ok(Json(branch))
}

/// Create a branch
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<BranchCreate>,
) -> AppResult<Json<Branch>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.city, "city", MAX_NAME_LEN)?;
    validate_optional_text(&payload.postal_code, "postalCode", MAX_SHORT_TEXT_LEN)?;

    let repo = BranchRepository::new(state.db.clone());
    let branch = repo.create(payload).await?;
    Ok(Json(branch))
}

/// Update a branch
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<BranchUpdate>,
) -> AppResult<Json<Branch>> {
    validate_optional_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.city, "city", MAX_NAME_LEN)?;
    validate_optional_text(&payload.postal_code, "postalCode", MAX_SHORT_TEXT_LEN)?;

    let repo = BranchRepository::new(state.db.clone());
    let branch = repo.update(&id, payload).await?;
    Ok(Json(branch))
}

/// Deactivate a branch. Partitions already created for its city remain.
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    let repo = BranchRepository::new(state.db.clone());
    let deleted = repo.delete(&id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Branch {} not found", id)));
    }
    Ok(Json(true))
}
