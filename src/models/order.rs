use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ORDER_STATUS_PENDING: i32 = 0;
pub const ORDER_STATUS_CONFIRMED: i32 = 1;
pub const ORDER_STATUS_COMPLETED: i32 = 2;
pub const ORDER_STATUS_CANCELLED: i32 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub accommodation_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub status: i32,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub price: i64,
    pub holiday_price: f64,
    pub check_in_rush_price: f64,
    pub sold_out_price: f64,
    pub discount_price: f64,
    pub total_price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
