//! Store traits and their implementations.
//!
//! Traits are the seam between services and storage. `memory` backs tests
//! and local development; `postgres` is the production backend.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use storefront_cart::Cart;
use storefront_catalog::{Brand, Category, Product};
use storefront_core::{
    AddressId, BrandId, CartId, CartLineId, CategoryId, CouponId, OrderId, ProductId, UserId,
};
use storefront_coupons::Coupon;
use storefront_orders::Order;
use storefront_users::{Address, SupportTicket};

use crate::error::StoreResult;

/// Product, brand and category storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    async fn update_product(&self, product: &Product) -> StoreResult<()>;
    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>>;
    async fn products(&self) -> StoreResult<Vec<Product>>;
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()>;
    async fn brands(&self) -> StoreResult<Vec<Brand>>;
    async fn delete_brand(&self, id: BrandId) -> StoreResult<()>;

    async fn insert_category(&self, category: &Category) -> StoreResult<()>;
    async fn categories(&self) -> StoreResult<Vec<Category>>;
    async fn delete_category(&self, id: CategoryId) -> StoreResult<()>;
}

/// Cart aggregate storage.
///
/// Carts are saved wholesale: the line set and totals written together, so
/// a reader never observes a cart mid-mutation.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Return the user's cart, creating an empty one if none exists.
    ///
    /// One cart per user is a storage invariant (unique constraint on the
    /// user id); concurrent calls converge on the same cart.
    async fn create_if_absent(&self, user_id: UserId) -> StoreResult<Cart>;

    async fn by_user(&self, user_id: UserId) -> StoreResult<Option<Cart>>;
    async fn get(&self, id: CartId) -> StoreResult<Option<Cart>>;

    /// Find the cart that contains the given line item.
    async fn by_line(&self, line_id: CartLineId) -> StoreResult<Option<Cart>>;

    async fn save(&self, cart: &Cart) -> StoreResult<()>;
    async fn delete(&self, id: CartId) -> StoreResult<()>;
}

/// Coupon and per-user usage storage.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Insert a coupon; fails with `Conflict` when the code is taken.
    async fn insert(&self, coupon: &Coupon) -> StoreResult<()>;

    /// Update a coupon's definition. `used_count` is never written here;
    /// it only moves through `record_usage`.
    async fn update(&self, coupon: &Coupon) -> StoreResult<()>;

    async fn get(&self, id: CouponId) -> StoreResult<Option<Coupon>>;
    async fn by_code(&self, code: &str) -> StoreResult<Option<Coupon>>;
    async fn list(&self) -> StoreResult<Vec<Coupon>>;

    async fn has_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<bool>;

    /// Record a redemption: insert the usage row and bump `used_count` in
    /// one atomic step, re-checking the global cap under the write.
    ///
    /// Fails with `CouponAlreadyUsed` when the user has a prior usage row
    /// and `CouponLimitExceeded` when the cap is exhausted; either failure
    /// leaves both the row and the counter untouched.
    async fn record_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()>;
}

/// Delivery address storage.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn insert(&self, address: &Address) -> StoreResult<()>;
    async fn get(&self, id: AddressId) -> StoreResult<Option<Address>>;
    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Address>>;
    async fn delete(&self, id: AddressId) -> StoreResult<()>;
}

/// Support ticket storage. Tickets are write-once.
#[async_trait]
pub trait SupportStore: Send + Sync {
    async fn insert(&self, ticket: &SupportTicket) -> StoreResult<()>;
    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<SupportTicket>>;
    async fn all(&self) -> StoreResult<Vec<SupportTicket>>;
}

/// Aggregated order figures for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: u64,
    /// Sum of order totals, cancelled orders excluded.
    pub total_revenue: Decimal,
    pub status_counts: BTreeMap<String, u64>,
    /// Most recent orders, newest first.
    pub recent: Vec<Order>,
}

/// Order storage, including the atomic checkout step.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Materialize an order from its cart in one atomic unit:
    /// insert the order and its items, decrement stock for every item
    /// (failing with `InsufficientStock` if any product cannot cover its
    /// quantity), and delete the cart. On any failure nothing is applied.
    ///
    /// The order number is unique; a collision fails with `Conflict` so the
    /// caller can retry with a fresh number.
    async fn materialize(&self, order: &Order, cart_id: CartId) -> StoreResult<()>;

    async fn get(&self, id: OrderId) -> StoreResult<Option<Order>>;
    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;
    async fn all(&self) -> StoreResult<Vec<Order>>;

    /// Persist a status change. The lifecycle check happens on the domain
    /// object before this call.
    async fn update_status(&self, order: &Order) -> StoreResult<()>;

    async fn delete(&self, id: OrderId) -> StoreResult<()>;
    async fn stats(&self) -> StoreResult<OrderStats>;
}
