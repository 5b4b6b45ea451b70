use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::api::common::{ApiError, Envelope};
use crate::middleware::auth::{issue_token, Role};
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub role: i32,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<Envelope<LoginResponse>>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let user: User = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_string()))?;

    let valid = bcrypt::verify(&payload.password, &user.password)
        .map_err(|e| ApiError::Internal(e.into()))?;
    if !valid {
        return Err(ApiError::Unauthorized("invalid credentials".to_string()));
    }

    let role = Role::from_i32(user.role);
    let token = issue_token(user.id, role)?;
    info!(user_id = user.id, "login successful");
    Ok(Json(Envelope::success(LoginResponse {
        token,
        user_id: user.id,
        name: user.name,
        role: user.role,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[serde(default)]
    pub phone_number: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<Envelope<LoginResponse>>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await?;
    if exists.is_some() {
        return Err(ApiError::BadRequest("email already registered".to_string()));
    }

    let hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let role = Role::Admin;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, phone_number, avatar, role, status, \
         created_at, updated_at) \
         VALUES ($1, $2, $3, $4, '', $5, 0, NOW(), NOW()) RETURNING id",
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hash)
    .bind(&payload.phone_number)
    .bind(role.as_i32())
    .fetch_one(&state.db_pool)
    .await?;

    let token = issue_token(id, role)?;
    info!(user_id = id, "account registered");
    Ok(Json(Envelope::success(LoginResponse {
        token,
        user_id: id,
        name: payload.name,
        role: role.as_i32(),
    })))
}
