use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Daily revenue rollup per admin, bumped on every paid invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserRevenue {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub revenue: f64,
    pub order_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
