use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_cart::Cart;
use storefront_core::{
    AddressId, CouponId, DomainError, DomainResult, Entity, OrderId, ProductId, UserId,
};

/// Order status lifecycle.
///
/// `Pending → Processing → Shipped → Delivered`; `Cancelled` is reachable
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `self → next` is a permitted transition.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            OrderStatus::Processing => self == OrderStatus::Pending,
            OrderStatus::Shipped => self == OrderStatus::Processing,
            OrderStatus::Delivered => self == OrderStatus::Shipped,
            OrderStatus::Pending => false,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::invalid_input(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// Immutable item snapshot: product, quantity, price at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: Decimal,
}

/// Immutable snapshot of a completed purchase.
///
/// Created once at checkout; item prices and totals are never re-derived from
/// the cart afterwards. Only `status` changes, via `transition_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub address_id: Option<AddressId>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub coupon_id: Option<CouponId>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Build the order snapshot from a finalized cart.
    ///
    /// Fails with `CartEmpty` when the cart has no line items. Totals are
    /// copied from the cart, which keeps them consistent by construction.
    pub fn from_cart(cart: &Cart, order_number: String, now: DateTime<Utc>) -> DomainResult<Self> {
        if cart.is_empty() {
            return Err(DomainError::CartEmpty);
        }

        let items = cart
            .lines()
            .iter()
            .map(|l| OrderItem {
                product_id: l.product_id,
                quantity: l.quantity,
                price: l.unit_price,
            })
            .collect();

        Ok(Self {
            id: OrderId::new(),
            order_number,
            user_id: cart.user_id(),
            address_id: cart.address_id(),
            items,
            subtotal: cart.subtotal(),
            discount: cart.discount(),
            total: cart.total(),
            coupon_id: cart.coupon().map(|c| c.coupon_id),
            status: OrderStatus::Pending,
            created_at: now,
        })
    }

    /// Apply a status transition, rejecting anything the lifecycle forbids.
    pub fn transition_to(&mut self, next: OrderStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_input(format!(
                "cannot move order from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Generate a human-readable order number: `ORD` + epoch millis + a suffix
/// drawn from a fresh UUID.
///
/// Collisions are possible in principle; the store enforces uniqueness and
/// checkout retries with a fresh suffix on conflict.
pub fn order_number(now: DateTime<Utc>) -> String {
    let suffix = uuid::Uuid::now_v7().as_u128() % 1000;
    format!("ORD{}{:03}", now.timestamp_millis(), suffix)
}
