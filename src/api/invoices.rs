use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db::{self, admin_scope_for};
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::{Invoice, INVOICE_PAID};
use crate::state::AppState;

pub async fn list_invoices(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<Vec<Invoice>>>, ApiError> {
    let key = CacheKeyPolicy::derive(Resource::Invoices, user.role, user.user_id);
    let scope = admin_scope_for(&state.db_pool, user).await?;
    let pool = state.db_pool.clone();
    let invoices = get_or_load_list(state.store.as_ref(), &key, ttl::list_ttl(), || async move {
        db::load_invoices(&pool, scope).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::success(invoices)))
}

#[derive(Debug, Deserialize)]
pub struct PaymentPayload {
    pub payment_type: i32,
}

/// Mark an invoice paid, bump the owning admin's daily revenue rollup, then
/// purge every cached invoice view.
pub async fn pay_invoice(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }

    let invoice: Invoice = sqlx::query_as("SELECT * FROM invoices WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or(ApiError::NotFound("invoice"))?;
    if invoice.status == INVOICE_PAID {
        return Err(ApiError::BadRequest("invoice already paid".to_string()));
    }

    sqlx::query(
        "UPDATE invoices SET status = $1, paid_amount = total_amount, remaining_amount = 0, \
         payment_date = NOW(), payment_type = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(INVOICE_PAID)
    .bind(payload.payment_type)
    .bind(id)
    .execute(&state.db_pool)
    .await?;

    sqlx::query(
        "INSERT INTO user_revenues (user_id, date, revenue, order_count, created_at, updated_at) \
         VALUES ($1, $2, $3, 1, NOW(), NOW()) \
         ON CONFLICT (user_id, date) DO UPDATE SET \
         revenue = user_revenues.revenue + EXCLUDED.revenue, \
         order_count = user_revenues.order_count + 1, updated_at = NOW()",
    )
    .bind(invoice.admin_id)
    .bind(Utc::now().date_naive())
    .bind(invoice.total_amount)
    .execute(&state.db_pool)
    .await?;

    state.fanout.payment_status_change(user.user_id).await;
    Ok(Json(Envelope::message("payment recorded")))
}
