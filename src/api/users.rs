use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::api::accommodations::StatusPayload;
use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db::{self, admin_scope_for};
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::StaffView;
use crate::state::AppState;

/// Staff listing scoped to the caller: super-admins see everyone, an admin
/// sees themself plus their receptionists.
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<Vec<StaffView>>>, ApiError> {
    if user.role == Role::Guest || user.role == Role::Receptionist {
        return Err(ApiError::Forbidden);
    }
    let key = CacheKeyPolicy::derive(Resource::Users, user.role, user.user_id);
    let scope = admin_scope_for(&state.db_pool, user).await?;
    let pool = state.db_pool.clone();
    let staff = get_or_load_list(state.store.as_ref(), &key, ttl::list_ttl(), || async move {
        db::load_staff(&pool, scope).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::success(staff)))
}

pub async fn change_user_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role != Role::SuperAdmin && user.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let result = sqlx::query("UPDATE users SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(payload.status)
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("user"));
    }

    state
        .fanout
        .invalidate(Resource::Users, user.role, user.user_id)
        .await;
    Ok(Json(Envelope::message("status updated")))
}
