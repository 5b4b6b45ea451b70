pub mod accommodations;
pub mod auth;
pub mod benefits;
pub mod chat;
pub mod common;
pub mod invoices;
pub mod orders;
pub mod revenue;
pub mod rooms;
pub mod users;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::middleware::auth::require_auth;
use crate::state::AppState;

/// Routes reachable without a token. Anonymous callers read the global
/// cache scope.
fn public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/user/accommodations", get(accommodations::search_accommodations))
        .route("/accommodations/statuses", get(accommodations::accommodation_statuses))
        .route("/rooms/statuses", get(rooms::room_statuses))
        .route("/benefits", get(benefits::list_benefits))
        .route("/orders", post(orders::create_order))
        .route("/chat/search", post(chat::chat_search))
}

/// Logged-in user routes (any role).
fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/orders", get(orders::user_orders))
        .layer(from_fn(require_auth))
}

/// Staff routes, nested under /admin behind JWT auth.
fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/accommodations",
            get(accommodations::list_accommodations).post(accommodations::create_accommodation),
        )
        .route("/accommodations/:id", put(accommodations::update_accommodation))
        .route(
            "/accommodations/:id/status",
            put(accommodations::change_accommodation_status),
        )
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/rooms/:id", put(rooms::update_room))
        .route("/rooms/:id/status", put(rooms::change_room_status))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id/status", put(orders::change_order_status))
        .route("/invoices", get(invoices::list_invoices))
        .route("/invoices/:id/payment", put(invoices::pay_invoice))
        .route("/users", get(users::list_staff))
        .route("/users/:id/status", put(users::change_user_status))
        .route("/benefits", post(benefits::create_benefit))
        .route("/benefits/:id", put(benefits::update_benefit))
        .route("/revenue", get(revenue::list_revenue))
        .layer(from_fn(require_auth))
}

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(public_router())
        .merge(user_router())
        .nest("/admin", admin_router())
}
