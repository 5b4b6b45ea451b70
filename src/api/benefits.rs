use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db;
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::Benefit;
use crate::state::AppState;

/// Reference data, cached globally for 24 hours.
pub async fn list_benefits(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<Benefit>>>, ApiError> {
    let key = CacheKeyPolicy::all(Resource::Benefits);
    let pool = state.db_pool.clone();
    let benefits = get_or_load_list(state.store.as_ref(), &key, ttl::benefits_ttl(), || async move {
        db::load_benefits(&pool).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::success(benefits)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BenefitPayload {
    #[validate(length(min = 1))]
    pub name: String,
}

pub async fn create_benefit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BenefitPayload>,
) -> Result<Json<Envelope<i32>>, ApiError> {
    if user.role != Role::SuperAdmin {
        return Err(ApiError::Forbidden);
    }
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id: i32 = sqlx::query_scalar(
        "INSERT INTO benefits (name, status, created_at, updated_at) \
         VALUES ($1, 0, NOW(), NOW()) RETURNING id",
    )
    .bind(&payload.name)
    .fetch_one(&state.db_pool)
    .await?;

    state
        .fanout
        .delete_key(&CacheKeyPolicy::all(Resource::Benefits))
        .await;
    Ok(Json(Envelope::success(id)))
}

pub async fn update_benefit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<BenefitPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role != Role::SuperAdmin {
        return Err(ApiError::Forbidden);
    }
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = sqlx::query("UPDATE benefits SET name = $1, updated_at = NOW() WHERE id = $2")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("benefit"));
    }

    state
        .fanout
        .delete_key(&CacheKeyPolicy::all(Resource::Benefits))
        .await;
    Ok(Json(Envelope::message("updated")))
}
