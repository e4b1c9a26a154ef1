//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business/domain failures (validation,
/// eligibility, stock). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, non-positive quantity).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A requested resource was not found (domain-level).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Requested quantity exceeds the product's available stock.
    #[error("not enough stock available")]
    InsufficientStock,

    /// Coupon code does not exist or is inactive.
    #[error("invalid coupon code")]
    CouponInvalid,

    /// Coupon's validity window has passed.
    #[error("this coupon has expired")]
    CouponExpired,

    /// Coupon's validity window has not opened yet.
    #[error("this coupon is not valid yet")]
    CouponNotYetValid,

    /// Coupon's global usage cap has been reached.
    #[error("coupon usage limit exceeded")]
    CouponLimitExceeded,

    /// This user has already consumed the coupon.
    #[error("this coupon has already been used")]
    CouponAlreadyUsed,

    /// Cart/order subtotal is below the coupon's minimum purchase threshold.
    #[error("minimum order amount of {0} required")]
    MinimumPurchaseNotMet(Decimal),

    /// Checkout was attempted on a cart with no line items.
    #[error("cart is empty")]
    CartEmpty,

    /// A uniqueness constraint would be violated (e.g. duplicate coupon code).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound(what)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Machine-readable kind, stable across message changes.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidInput(_) => "invalid_input",
            DomainError::NotFound(_) => "not_found",
            DomainError::InsufficientStock => "insufficient_stock",
            DomainError::CouponInvalid => "coupon_invalid",
            DomainError::CouponExpired => "coupon_expired",
            DomainError::CouponNotYetValid => "coupon_not_yet_valid",
            DomainError::CouponLimitExceeded => "coupon_limit_exceeded",
            DomainError::CouponAlreadyUsed => "coupon_already_used",
            DomainError::MinimumPurchaseNotMet(_) => "minimum_purchase_not_met",
            DomainError::CartEmpty => "cart_empty",
            DomainError::Conflict(_) => "conflict",
            DomainError::Unauthorized => "unauthorized",
        }
    }
}
