use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::api::accommodations::StatusPayload;
use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db::{self, admin_scope_for};
use crate::middleware::auth::{user_from_headers, CurrentUser, Role};
use crate::models::{Order, ORDER_STATUS_PENDING};
use crate::services::MailService;
use crate::state::AppState;

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<Vec<Order>>>, ApiError> {
    let key = CacheKeyPolicy::derive(Resource::Orders, user.role, user.user_id);
    let scope = admin_scope_for(&state.db_pool, user).await?;
    let pool = state.db_pool.clone();
    let orders = get_or_load_list(state.store.as_ref(), &key, ttl::list_ttl(), || async move {
        db::load_orders(&pool, scope).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::success(orders)))
}

/// Booking history of the calling user.
pub async fn user_orders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<Vec<Order>>>, ApiError> {
    let key = CacheKeyPolicy::user_orders(user.user_id);
    let pool = state.db_pool.clone();
    let user_id = user.user_id;
    let orders = get_or_load_list(state.store.as_ref(), &key, ttl::list_ttl(), || async move {
        db::load_user_orders(&pool, user_id).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)?;
    Ok(Json(Envelope::success(orders)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrder {
    pub accommodation_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[validate(length(min = 1))]
    pub guest_name: String,
    #[validate(email)]
    pub guest_email: String,
    #[serde(default)]
    pub guest_phone: String,
    #[serde(default)]
    pub holiday_price: f64,
    #[serde(default)]
    pub check_in_rush_price: f64,
    #[serde(default)]
    pub sold_out_price: f64,
    #[serde(default)]
    pub discount_price: f64,
}

/// Create a booking, price the stay, invoice it and notify the guest.
/// Anonymous guests can book; a logged-in user gets the order on their
/// history.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateOrder>,
) -> Result<Json<Envelope<Order>>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.check_out_date <= payload.check_in_date {
        return Err(ApiError::BadRequest(
            "check-out must be after check-in".to_string(),
        ));
    }

    let user = user_from_headers(&headers);
    let user_id = (user.user_id != 0).then_some(user.user_id);

    let (nightly_price, owner_id, accommodation_name): (i64, i64, String) =
        sqlx::query_as("SELECT price, user_id, name FROM accommodations WHERE id = $1")
            .bind(payload.accommodation_id)
            .fetch_optional(&state.db_pool)
            .await?
            .ok_or(ApiError::NotFound("accommodation"))?;

    let nights = (payload.check_out_date - payload.check_in_date).num_days().max(1);
    let price = nightly_price * nights;
    let total_price = price as f64 + payload.holiday_price + payload.check_in_rush_price
        + payload.sold_out_price
        - payload.discount_price;

    let order: Order = sqlx::query_as(
        "INSERT INTO orders (user_id, accommodation_id, check_in_date, check_out_date, status, \
         guest_name, guest_email, guest_phone, price, holiday_price, check_in_rush_price, \
         sold_out_price, discount_price, total_price, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW(), NOW()) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(payload.accommodation_id)
    .bind(payload.check_in_date)
    .bind(payload.check_out_date)
    .bind(ORDER_STATUS_PENDING)
    .bind(&payload.guest_name)
    .bind(&payload.guest_email)
    .bind(&payload.guest_phone)
    .bind(price)
    .bind(payload.holiday_price)
    .bind(payload.check_in_rush_price)
    .bind(payload.sold_out_price)
    .bind(payload.discount_price)
    .bind(total_price)
    .fetch_one(&state.db_pool)
    .await?;

    sqlx::query(
        "INSERT INTO invoices (invoice_code, order_id, total_amount, paid_amount, \
         remaining_amount, status, admin_id, created_at, updated_at) \
         VALUES ($1, $2, $3, 0, $3, $4, $5, NOW(), NOW())",
    )
    .bind(format!("INV-{}", order.id))
    .bind(order.id)
    .bind(total_price)
    .bind(crate::models::INVOICE_UNPAID)
    .bind(owner_id)
    .execute(&state.db_pool)
    .await?;

    // Best-effort guest notification, never blocks the booking.
    let mail_order = order.clone();
    tokio::spawn(async move {
        match MailService::new() {
            Ok(mailer) => {
                if let Err(e) = mailer
                    .send_order_confirmation(&mail_order, &accommodation_name)
                    .await
                {
                    warn!("Order confirmation email failed: {}", e);
                }
            }
            Err(e) => warn!("Mail service unavailable: {}", e),
        }
    });

    state.fanout.order_mutation(user.user_id, owner_id).await;
    Ok(Json(Envelope::success(order)))
}

pub async fn change_order_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }

    let result = sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(payload.status)
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("order"));
    }

    let owner_id: i64 = sqlx::query_scalar(
        "SELECT a.user_id FROM orders o \
         JOIN accommodations a ON a.id = o.accommodation_id WHERE o.id = $1",
    )
    .bind(id)
    .fetch_one(&state.db_pool)
    .await?;

    state
        .fanout
        .invalidate(Resource::Orders, user.role, user.user_id)
        .await;
    state.fanout.order_mutation(user.user_id, owner_id).await;
    Ok(Json(Envelope::message("status updated")))
}
