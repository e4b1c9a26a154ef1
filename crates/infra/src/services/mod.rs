//! Application services: orchestration of domain aggregates over stores.

mod cart_manager;
mod coupons;
mod orders;

pub use cart_manager::CartManager;
pub use coupons::CouponRedemption;
pub use orders::OrderService;
