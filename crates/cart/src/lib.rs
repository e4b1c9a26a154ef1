//! `storefront-cart` — the per-user cart aggregate.

pub mod cart;

pub use cart::{AppliedCoupon, Cart, CartLine};
