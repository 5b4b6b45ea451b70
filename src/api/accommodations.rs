use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::api::common::{ApiError, Envelope};
use crate::cache::{get_or_load_list, ttl, CacheKeyPolicy, Resource};
use crate::db::{self, admin_scope_for};
use crate::listing::{busy_accommodations, decode_param, paginate, FilterCriteria, Pagination, DEFAULT_LIMIT};
use crate::middleware::auth::{user_from_headers, CurrentUser, Role};
use crate::models::{AccommodationStatusWindow, AccommodationView};
use crate::search;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AccommodationListQuery {
    pub name: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<i32>,
    pub status: Option<i32>,
    pub num: Option<i32>,
    pub num_bed: Option<i32>,
    pub num_tolet: Option<i32>,
    pub people: Option<i32>,
    /// Comma-separated benefit ids.
    pub benefit_ids: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

fn criteria_from(query: &AccommodationListQuery) -> FilterCriteria {
    FilterCriteria {
        kind: query.kind,
        status: query.status,
        num: query.num,
        num_bed: query.num_bed,
        num_tolet: query.num_tolet,
        people: query.people,
        name: query.name.as_deref().map(decode_param),
        province: query.province.as_deref().map(decode_param),
        district: query.district.as_deref().map(decode_param),
        benefit_ids: parse_ids(query.benefit_ids.as_deref()),
        ..Default::default()
    }
}

fn parse_ids(raw: Option<&str>) -> Vec<i32> {
    raw.map(|s| s.split(',').filter_map(|part| part.trim().parse().ok()).collect())
        .unwrap_or_default()
}

/// Cached accommodation snapshot for one caller scope.
pub async fn cached_accommodations(
    state: &AppState,
    user: CurrentUser,
) -> Result<Vec<AccommodationView>, ApiError> {
    let key = CacheKeyPolicy::derive(Resource::Accommodations, user.role, user.user_id);
    let scope = admin_scope_for(&state.db_pool, user).await?;
    let pool = state.db_pool.clone();
    get_or_load_list(state.store.as_ref(), &key, ttl::list_ttl(), || async move {
        db::load_accommodations(&pool, scope).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)
}

/// Cached day-granular occupancy windows.
pub async fn cached_statuses(
    state: &AppState,
) -> Result<Vec<AccommodationStatusWindow>, ApiError> {
    let key = CacheKeyPolicy::statuses(Resource::Accommodations);
    let pool = state.db_pool.clone();
    get_or_load_list(state.store.as_ref(), &key, ttl::statuses_ttl(), || async move {
        db::load_accommodation_statuses(&pool).await.map_err(Into::into)
    })
    .await
    .map_err(ApiError::Internal)
}

async fn listing(
    state: &AppState,
    user: CurrentUser,
    query: AccommodationListQuery,
) -> Result<Json<Envelope<Vec<AccommodationView>>>, ApiError> {
    let snapshot = cached_accommodations(state, user).await?;

    let mut criteria = criteria_from(&query);
    if query.from_date.is_some() && query.to_date.is_some() {
        let windows = cached_statuses(state).await?;
        criteria.excluded_ids = busy_accommodations(&windows, query.from_date, query.to_date);
    }
    let mut filtered = criteria.apply(&snapshot);

    if let Some(text) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
        filtered = search::rank(&decode_param(text), filtered)
            .await
            .into_iter()
            .map(|scored| scored.item)
            .collect();
    } else {
        filtered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    let page = query.page.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let total = filtered.len();
    let items = paginate(&filtered, page, limit);
    Ok(Json(Envelope::success_paged(items, Pagination { page, limit, total })))
}

/// Staff listing, scoped by the caller's role.
pub async fn list_accommodations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AccommodationListQuery>,
) -> Result<Json<Envelope<Vec<AccommodationView>>>, ApiError> {
    listing(&state, user, query).await
}

/// Public listing. Anonymous callers read the global snapshot.
pub async fn search_accommodations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AccommodationListQuery>,
) -> Result<Json<Envelope<Vec<AccommodationView>>>, ApiError> {
    let user = user_from_headers(&headers);
    listing(&state, user, query).await
}

pub async fn accommodation_statuses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<Vec<AccommodationStatusWindow>>>, ApiError> {
    let windows = cached_statuses(&state).await?;
    Ok(Json(Envelope::success(windows)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AccommodationPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub address: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub num: i32,
    #[serde(default)]
    pub people: i32,
    #[validate(range(min = 0))]
    pub price: i64,
    #[serde(default)]
    pub num_bed: i32,
    #[serde(default)]
    pub num_tolet: i32,
    pub province: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub ward: String,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub benefit_ids: Vec<i32>,
}

fn require_manager(user: CurrentUser) -> Result<(), ApiError> {
    match user.role {
        Role::SuperAdmin | Role::Admin => Ok(()),
        _ => Err(ApiError::Forbidden),
    }
}

pub async fn create_accommodation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AccommodationPayload>,
) -> Result<Json<Envelope<i64>>, ApiError> {
    require_manager(user)?;
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO accommodations \
         (type, user_id, name, address, avatar, short_description, status, num, people, \
          price, num_bed, num_tolet, province, district, ward, longitude, latitude, \
          created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
          NOW(), NOW()) RETURNING id",
    )
    .bind(payload.kind)
    .bind(user.user_id)
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(&payload.avatar)
    .bind(&payload.short_description)
    .bind(payload.num)
    .bind(payload.people)
    .bind(payload.price)
    .bind(payload.num_bed)
    .bind(payload.num_tolet)
    .bind(&payload.province)
    .bind(&payload.district)
    .bind(&payload.ward)
    .bind(payload.longitude)
    .bind(payload.latitude)
    .fetch_one(&state.db_pool)
    .await?;

    for benefit_id in &payload.benefit_ids {
        sqlx::query(
            "INSERT INTO accommodation_benefits (accommodation_id, benefit_id) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(benefit_id)
        .execute(&state.db_pool)
        .await?;
    }

    state
        .fanout
        .invalidate(Resource::Accommodations, user.role, user.user_id)
        .await;
    Ok(Json(Envelope::success(id)))
}

pub async fn update_accommodation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<AccommodationPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    require_manager(user)?;
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let result = sqlx::query(
        "UPDATE accommodations SET type = $1, name = $2, address = $3, avatar = $4, \
         short_description = $5, num = $6, people = $7, price = $8, num_bed = $9, \
         num_tolet = $10, province = $11, district = $12, ward = $13, longitude = $14, \
         latitude = $15, updated_at = NOW() WHERE id = $16",
    )
    .bind(payload.kind)
    .bind(&payload.name)
    .bind(&payload.address)
    .bind(&payload.avatar)
    .bind(&payload.short_description)
    .bind(payload.num)
    .bind(payload.people)
    .bind(payload.price)
    .bind(payload.num_bed)
    .bind(payload.num_tolet)
    .bind(&payload.province)
    .bind(&payload.district)
    .bind(&payload.ward)
    .bind(payload.longitude)
    .bind(payload.latitude)
    .bind(id)
    .execute(&state.db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("accommodation"));
    }

    sqlx::query("DELETE FROM accommodation_benefits WHERE accommodation_id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await?;
    for benefit_id in &payload.benefit_ids {
        sqlx::query(
            "INSERT INTO accommodation_benefits (accommodation_id, benefit_id) VALUES ($1, $2)",
        )
        .bind(id)
        .bind(benefit_id)
        .execute(&state.db_pool)
        .await?;
    }

    state
        .fanout
        .invalidate(Resource::Accommodations, user.role, user.user_id)
        .await;
    Ok(Json(Envelope::message("updated")))
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: i32,
}

pub async fn change_accommodation_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if user.role == Role::Guest {
        return Err(ApiError::Forbidden);
    }

    let result = sqlx::query(
        "UPDATE accommodations SET status = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(payload.status)
    .bind(id)
    .execute(&state.db_pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("accommodation"));
    }

    state
        .fanout
        .invalidate(Resource::Accommodations, user.role, user.user_id)
        .await;
    state
        .fanout
        .delete_key(&CacheKeyPolicy::statuses(Resource::Accommodations))
        .await;
    Ok(Json(Envelope::message("status updated")))
}
