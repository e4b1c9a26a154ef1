//! Infrastructure layer: persistence adapters and application services.
//!
//! The domain crates are pure; everything that touches storage lives here.
//! Stores come in two flavors behind the same traits: in-memory (tests/dev)
//! and Postgres (production). Services orchestrate domain aggregates against
//! the stores and are what the HTTP layer calls.

pub mod error;
pub mod services;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use services::{CartManager, CouponRedemption, OrderService};
pub use store::{
    AddressStore, CartStore, CatalogStore, CouponStore, OrderStats, OrderStore, SupportStore,
};

#[cfg(test)]
mod integration_tests;
