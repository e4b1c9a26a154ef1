//! `storefront-users` — user-owned account records.
//!
//! Delivery addresses (referenced by carts and snapshotted into orders) and
//! support tickets. Pure domain, no IO.

pub mod address;
pub mod support;

pub use address::Address;
pub use support::SupportTicket;
