use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoomView {
    pub id: i64,
    pub accommodation_id: i64,
    pub room_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: i32,
    pub num_bed: i32,
    pub num_tolet: i32,
    pub acreage: i32,
    pub price: i64,
    pub description: String,
    pub status: i32,
    pub avatar: String,
    pub num: i32,
    pub people: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoomStatusWindow {
    pub room_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}
