use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::benefit::Benefit;

/// Accommodation kinds. Stored as an int; the fuzzy scorer maps query
/// keywords onto these values.
pub const KIND_HOTEL: i32 = 0;
pub const KIND_HOMESTAY: i32 = 1;
pub const KIND_VILLA: i32 = 2;

#[derive(Debug, Clone, FromRow)]
pub struct AccommodationRow {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub kind: i32,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub avatar: String,
    pub short_description: String,
    pub status: i32,
    pub num: i32,
    pub people: i32,
    pub price: i64,
    pub num_bed: i32,
    pub num_tolet: i32,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub longitude: f64,
    pub latitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response shape cached per role scope and served by the list endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationView {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: i32,
    pub user_id: i64,
    pub name: String,
    pub address: String,
    pub avatar: String,
    pub short_description: String,
    pub status: i32,
    pub num: i32,
    pub people: i32,
    pub price: i64,
    pub num_bed: i32,
    pub num_tolet: i32,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub longitude: f64,
    pub latitude: f64,
    pub benefits: Vec<Benefit>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccommodationView {
    pub fn from_row(row: AccommodationRow, benefits: Vec<Benefit>) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            user_id: row.user_id,
            name: row.name,
            address: row.address,
            avatar: row.avatar,
            short_description: row.short_description,
            status: row.status,
            num: row.num,
            people: row.people,
            price: row.price,
            num_bed: row.num_bed,
            num_tolet: row.num_tolet,
            province: row.province,
            district: row.district,
            ward: row.ward,
            longitude: row.longitude,
            latitude: row.latitude,
            benefits,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Day-granular occupancy window derived from confirmed orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AccommodationStatusWindow {
    pub accommodation_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}
