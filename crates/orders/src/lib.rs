//! `storefront-orders` — immutable order snapshots and their lifecycle.

pub mod order;

pub use order::{Order, OrderItem, OrderStatus, order_number};
