use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const INVOICE_UNPAID: i32 = 0;
pub const INVOICE_PAID: i32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub invoice_code: String,
    pub order_id: i64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub remaining_amount: f64,
    pub status: i32,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_type: Option<i32>,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
