use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub avatar: String,
    pub role: i32,
    pub status: i32,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff listing shape cached per admin scope. Excludes credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StaffView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub avatar: String,
    pub role: i32,
    pub status: i32,
    pub admin_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
