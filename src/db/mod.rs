//! Read-side loaders behind the cache, plus the staff directory used by
//! invalidation fanout. Writes stay in the handlers that own them.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::cache::invalidation::StaffDirectory;
use crate::middleware::auth::{CurrentUser, Role};
use crate::models::{
    AccommodationRow, AccommodationStatusWindow, AccommodationView, Benefit, Invoice, Order,
    RoomStatusWindow, RoomView, StaffView, UserRevenue,
};

/// Visibility of a list query. `All` is the global scope served to
/// super-admins and anonymous readers; `Admin` narrows to one admin's
/// accommodations (a receptionist resolves to its owning admin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Admin(i64),
}

/// Map a caller onto the scope its queries and cache keys use.
pub async fn admin_scope_for(pool: &PgPool, user: CurrentUser) -> Result<ListScope, sqlx::Error> {
    match user.role {
        Role::Admin => Ok(ListScope::Admin(user.user_id)),
        Role::Receptionist => {
            let admin_id: Option<Option<i64>> =
                sqlx::query_scalar("SELECT admin_id FROM users WHERE id = $1")
                    .bind(user.user_id)
                    .fetch_optional(pool)
                    .await?;
            Ok(ListScope::Admin(
                admin_id.flatten().unwrap_or(user.user_id),
            ))
        }
        _ => Ok(ListScope::All),
    }
}

pub async fn load_accommodations(
    pool: &PgPool,
    scope: ListScope,
) -> Result<Vec<AccommodationView>, sqlx::Error> {
    let rows: Vec<AccommodationRow> = match scope {
        ListScope::All => {
            sqlx::query_as("SELECT * FROM accommodations ORDER BY id")
                .fetch_all(pool)
                .await?
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as("SELECT * FROM accommodations WHERE user_id = $1 ORDER BY id")
                .bind(admin_id)
                .fetch_all(pool)
                .await?
        }
    };

    let mut benefits = load_benefit_map(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let list = benefits.remove(&row.id).unwrap_or_default();
            AccommodationView::from_row(row, list)
        })
        .collect())
}

#[derive(sqlx::FromRow)]
struct AccommodationBenefitRow {
    accommodation_id: i64,
    #[sqlx(flatten)]
    benefit: Benefit,
}

/// Benefits per accommodation, loaded in one joined query.
async fn load_benefit_map(pool: &PgPool) -> Result<HashMap<i64, Vec<Benefit>>, sqlx::Error> {
    let rows: Vec<AccommodationBenefitRow> = sqlx::query_as(
        "SELECT ab.accommodation_id, b.id, b.name, b.status, b.created_at, b.updated_at \
         FROM accommodation_benefits ab \
         JOIN benefits b ON b.id = ab.benefit_id \
         ORDER BY ab.accommodation_id, b.id",
    )
    .fetch_all(pool)
    .await?;

    let mut map: HashMap<i64, Vec<Benefit>> = HashMap::new();
    for row in rows {
        map.entry(row.accommodation_id).or_default().push(row.benefit);
    }
    Ok(map)
}

pub async fn load_benefits(pool: &PgPool) -> Result<Vec<Benefit>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM benefits ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn load_rooms(pool: &PgPool, scope: ListScope) -> Result<Vec<RoomView>, sqlx::Error> {
    match scope {
        ListScope::All => {
            sqlx::query_as("SELECT * FROM rooms ORDER BY id")
                .fetch_all(pool)
                .await
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as(
                "SELECT r.* FROM rooms r \
                 JOIN accommodations a ON a.id = r.accommodation_id \
                 WHERE a.user_id = $1 ORDER BY r.id",
            )
            .bind(admin_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn load_orders(pool: &PgPool, scope: ListScope) -> Result<Vec<Order>, sqlx::Error> {
    match scope {
        ListScope::All => {
            sqlx::query_as("SELECT * FROM orders ORDER BY id DESC")
                .fetch_all(pool)
                .await
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as(
                "SELECT o.* FROM orders o \
                 JOIN accommodations a ON a.id = o.accommodation_id \
                 WHERE a.user_id = $1 ORDER BY o.id DESC",
            )
            .bind(admin_id)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn load_user_orders(pool: &PgPool, user_id: i64) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY id DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn load_invoices(pool: &PgPool, scope: ListScope) -> Result<Vec<Invoice>, sqlx::Error> {
    match scope {
        ListScope::All => {
            sqlx::query_as("SELECT * FROM invoices ORDER BY id DESC")
                .fetch_all(pool)
                .await
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as("SELECT * FROM invoices WHERE admin_id = $1 ORDER BY id DESC")
                .bind(admin_id)
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn load_staff(pool: &PgPool, scope: ListScope) -> Result<Vec<StaffView>, sqlx::Error> {
    match scope {
        ListScope::All => {
            sqlx::query_as(
                "SELECT id, name, email, phone_number, avatar, role, status, admin_id, \
                 created_at, updated_at FROM users ORDER BY id",
            )
            .fetch_all(pool)
            .await
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as(
                "SELECT id, name, email, phone_number, avatar, role, status, admin_id, \
                 created_at, updated_at FROM users \
                 WHERE admin_id = $1 OR id = $1 ORDER BY id",
            )
            .bind(admin_id)
            .fetch_all(pool)
            .await
        }
    }
}

/// Occupancy windows derived from orders that still hold their dates.
pub async fn load_accommodation_statuses(
    pool: &PgPool,
) -> Result<Vec<AccommodationStatusWindow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT accommodation_id, check_in_date AS from_date, check_out_date AS to_date \
         FROM orders WHERE status IN ($1, $2)",
    )
    .bind(crate::models::ORDER_STATUS_PENDING)
    .bind(crate::models::ORDER_STATUS_CONFIRMED)
    .fetch_all(pool)
    .await
}

pub async fn load_room_statuses(pool: &PgPool) -> Result<Vec<RoomStatusWindow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT room_id, from_date, to_date FROM room_statuses ORDER BY room_id",
    )
    .fetch_all(pool)
    .await
}

pub async fn load_revenue(
    pool: &PgPool,
    scope: ListScope,
    year: i32,
    month: u32,
) -> Result<Vec<UserRevenue>, sqlx::Error> {
    match scope {
        ListScope::All => {
            sqlx::query_as(
                "SELECT * FROM user_revenues \
                 WHERE EXTRACT(YEAR FROM date) = $1 AND EXTRACT(MONTH FROM date) = $2 \
                 ORDER BY date",
            )
            .bind(year)
            .bind(month as i32)
            .fetch_all(pool)
            .await
        }
        ListScope::Admin(admin_id) => {
            sqlx::query_as(
                "SELECT * FROM user_revenues \
                 WHERE user_id = $1 \
                 AND EXTRACT(YEAR FROM date) = $2 AND EXTRACT(MONTH FROM date) = $3 \
                 ORDER BY date",
            )
            .bind(admin_id)
            .bind(year)
            .bind(month as i32)
            .fetch_all(pool)
            .await
        }
    }
}

/// Staff lookups backing invalidation fanout.
#[derive(Clone)]
pub struct PgStaffDirectory {
    pool: PgPool,
}

impl PgStaffDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffDirectory for PgStaffDirectory {
    async fn receptionists_of(&self, admin_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT id FROM users WHERE admin_id = $1 AND role = $2")
            .bind(admin_id)
            .bind(Role::Receptionist.as_i32())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn admin_of(&self, receptionist_id: i64) -> Result<Option<i64>> {
        let admin_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT admin_id FROM users WHERE id = $1")
                .bind(receptionist_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(admin_id.flatten())
    }
}
