//! `storefront-coupons` — coupon entity and eligibility rules.

pub mod coupon;
pub mod eligibility;

pub use coupon::Coupon;
pub use eligibility::{RedemptionQuote, UserUsage, check_eligibility, redemption_quote};
