use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::api::accommodations::StatusPayload;
use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db::{self, admin_scope_for};
use crate::listing::{paginate, Pagination, DEFAULT_LIMIT};
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::{RoomStatusWindow, RoomView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    pub accommodation_id: Option<i64>,
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    pub status: Option<i32>,
    pub num_bed: Option<i32>,
    pub people: Option<i32>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

async fn cached_rooms(state: &AppState, user: CurrentUser) -> Result<Vec<RoomView>, ApiError> {
    let key = CacheKeyPolicy::derive(Resource::Rooms, user.role, user.user_id);
    let scope = admin_scope_for(&state.db_pool, user).await?;
    let pool = state.db_pool.clone();
    get_or_load_list(state.store.as_ref(), &key, ttl::rooms_ttl(), || async move {
        db::load_rooms(&pool, scope).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)
}

async fn cached_room_statuses(state: &AppState) -> Result<Vec<RoomStatusWindow>, ApiError> {
    let key = CacheKeyPolicy::statuses(Resource::Rooms);
    let pool = state.db_pool.clone();
    get_or_load_list(state.store.as_ref(), &key, ttl::statuses_ttl(), || async move {
        db::load_room_statuses(&pool).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)
}

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<RoomListQuery>,
) -> Result<Json<Envelope<Vec<RoomView>>>, ApiError> {
    let snapshot = cached_rooms(&state, user).await?;

    let busy: std::collections::HashSet<i64> =
        if query.from_date.is_some() && query.to_date.is_some() {
            let (from, to) = (query.from_date.unwrap(), query.to_date.unwrap());
            cached_room_statuses(&state)
                .await?
                .into_iter()
                .filter(|w| !(to < w.from_date || from > w.to_date))
                .map(|w| w.room_id)
                .collect()
        } else {
            Default::default()
        };

    let mut filtered: Vec<RoomView> = snapshot
        .into_iter()
        .filter(|room| {
            !busy.contains(&room.id)
                && query.accommodation_id.is_none_or(|v| room.accommodation_id == v)
                && query.kind.is_none_or(|v| room.kind == v)
                && query.status.is_none_or(|v| room.status == v)
                && query.num_bed.is_none_or(|v| room.num_bed == v)
                && query.people.is_none_or(|v| room.people == v)
        })
        .collect();
    filtered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let page = query.page.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let total = filtered.len();
    let items = paginate(&filtered, page, limit);
    Ok(Json(Envelope::success_paged(items, Pagination { page, limit, total })))
}

pub async fn room_statuses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<RoomStatusWindow>>>, ApiError> {
    let windows = cached_room_statuses(&state).await?;
    Ok(Json(Envelope::success(windows)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoomPayload {
    pub accommodation_id: i64,
    #[validate(length(min = 1))]
    pub room_name: String,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub num_bed: i32,
    #[serde(default)]
    pub num_tolet: i32,
    #[serde(default)]
    pub acreage: i32,
    #[validate(range(min = 0))]
    pub price: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub num: i32,
    #[serde(default)]
    pub people: i32,
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<RoomPayload>,
) -> Result<Json<Envelope<i64>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO rooms (accommodation_id, room_name, type, num_bed, num_tolet, acreage, \
         price, description, status, avatar, num, people, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10, $11, NOW(), NOW()) RETURNING id",
    )
    .bind(payload.accommodation_id)
    .bind(&payload.room_name)
    .bind(payload.kind)
    .bind(payload.num_bed)
    .bind(payload.num_tolet)
    .bind(payload.acreage)
    .bind(payload.price)
    .bind(&payload.description)
    .bind(&payload.avatar)
    .bind(payload.num)
    .bind(payload.people)
    .fetch_one(&state.db_pool)
    .await?;

    state
        .fanout
        .invalidate(Resource::Rooms, user.role, user.user_id)
        .await;
    Ok(Json(Envelope::success(id)))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<RoomPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = sqlx::query(
        "UPDATE rooms SET accommodation_id = $1, room_name = $2, type = $3, num_bed = $4, \
         num_tolet = $5, acreage = $6, price = $7, description = $8, avatar = $9, num = $10, \
         people = $11, updated_at = NOW() WHERE id = $12",
    )
    .bind(payload.accommodation_id)
    .bind(&payload.room_name)
    .bind(payload.kind)
    .bind(payload.num_bed)
    .bind(payload.num_tolet)
    .bind(payload.acreage)
    .bind(payload.price)
    .bind(&payload.description)
    .bind(&payload.avatar)
    .bind(payload.num)
    .bind(payload.people)
    .bind(id)
    .execute(&state.db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("room"));
    }

    state
        .fanout
        .invalidate(Resource::Rooms, user.role, user.user_id)
        .await;
    Ok(Json(Envelope::message("updated")))
}

pub async fn change_room_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }

    let result = sqlx::query("UPDATE rooms SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(payload.status)
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("room"));
    }

    state
        .fanout
        .invalidate(Resource::Rooms, user.role, user.user_id)
        .await;
    state
        .fanout
        .delete_key(&CacheKeyPolicy::statuses(Resource::Rooms))
        .await;
    Ok(Json(Envelope::message("status updated")))
}
