use axum::{Router, routing::get};

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod coupons;
pub mod orders;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(account::router())
        .merge(cart::router())
        .merge(coupons::router())
        .merge(orders::router())
        .merge(catalog::router())
        .merge(admin::router())
}
