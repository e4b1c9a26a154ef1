//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_uuid_newtype {
    ($(#[$doc:meta])* $t:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_input(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(
    /// Identifier of a user (actor identity).
    UserId,
    "UserId"
);
impl_uuid_newtype!(
    /// Identifier of a product.
    ProductId,
    "ProductId"
);
impl_uuid_newtype!(
    /// Identifier of a brand.
    BrandId,
    "BrandId"
);
impl_uuid_newtype!(
    /// Identifier of a category.
    CategoryId,
    "CategoryId"
);
impl_uuid_newtype!(
    /// Identifier of a user's active cart.
    CartId,
    "CartId"
);
impl_uuid_newtype!(
    /// Identifier of a single cart line item.
    CartLineId,
    "CartLineId"
);
impl_uuid_newtype!(
    /// Identifier of a coupon.
    CouponId,
    "CouponId"
);
impl_uuid_newtype!(
    /// Identifier of an order.
    OrderId,
    "OrderId"
);
impl_uuid_newtype!(
    /// Identifier of a shipping address.
    AddressId,
    "AddressId"
);
impl_uuid_newtype!(
    /// Identifier of a support ticket.
    SupportTicketId,
    "SupportTicketId"
);
