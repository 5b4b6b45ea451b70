use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy};
use crate::db::{self, admin_scope_for, ListScope};
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::UserRevenue;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Daily revenue rollups for one month. Admins see their own rollups,
/// super-admins see everyone's.
pub async fn list_revenue(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<Envelope<Vec<UserRevenue>>>, ApiError> {
    if user.role == Role::Guest || user.role == Role::Receptionist {
        return Err(ApiError::Forbidden);
    }

    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    let month = query.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(ApiError::BadRequest("month must be 1-12".to_string()));
    }

    let scope = admin_scope_for(&state.db_pool, user).await?;
    let rows = match scope {
        // Only admin scopes have a revenue cache key; the global view goes
        // straight to the database.
        ListScope::Admin(admin_id) => {
            let key = CacheKeyPolicy::revenue_for_month(admin_id, year, month);
            let pool = state.db_pool.clone();
            get_or_load_list(state.store.as_ref(), &key, ttl::revenue_ttl(), || async move {
                db::load_revenue(&pool, scope, year, month)
                    .await
                    .map_err(Into::into)
            })
            .await
            .map_err(ApiError::Internal)?
        }
        ListScope::All => db::load_revenue(&state.db_pool, scope, year, month).await?,
    };
    Ok(Json(Envelope::success(rows)))
}
