//! Checkout and order lifecycle.

use std::sync::Arc;

use chrono::Utc;

use storefront_core::{DomainError, OrderId, UserId};
use storefront_orders::{Order, OrderStatus, order_number};

use crate::error::{StoreError, StoreResult};
use crate::store::{CartStore, OrderStats, OrderStore};

/// Order-number collisions are improbable; a couple of retries with a fresh
/// suffix is enough.
const ORDER_NUMBER_ATTEMPTS: u32 = 3;

pub struct OrderService {
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(carts: Arc<dyn CartStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { carts, orders }
    }

    /// Materialize the user's cart into an order.
    ///
    /// The snapshot is built from the cart as-is; the store then applies the
    /// order insert, the conditional stock decrements and the cart deletion
    /// as one atomic unit. A duplicate order number retries with a fresh one;
    /// any other failure surfaces unchanged.
    pub async fn checkout(&self, user_id: UserId) -> StoreResult<Order> {
        let cart = self
            .carts
            .by_user(user_id)
            .await?
            .ok_or(DomainError::not_found("cart"))?;

        let mut last_conflict = None;
        for attempt in 0..ORDER_NUMBER_ATTEMPTS {
            let now = Utc::now();
            let order = Order::from_cart(&cart, order_number(now), now)?;

            match self.orders.materialize(&order, cart.id_typed()).await {
                Ok(()) => {
                    tracing::info!(
                        order_number = %order.order_number,
                        user_id = %user_id,
                        total = %order.total,
                        "order created"
                    );
                    return Ok(order);
                }
                Err(StoreError::Domain(DomainError::Conflict(msg))) => {
                    tracing::warn!(attempt, conflict = %msg, "order number collision, retrying");
                    last_conflict = Some(msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::conflict(
            last_conflict.unwrap_or_else(|| "order number".to_string()),
        )
        .into())
    }

    pub async fn get(&self, id: OrderId) -> StoreResult<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("order").into())
    }

    pub async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        self.orders.for_user(user_id).await
    }

    pub async fn all(&self) -> StoreResult<Vec<Order>> {
        self.orders.all().await
    }

    /// Apply a lifecycle transition and persist it.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> StoreResult<Order> {
        let mut order = self.get(id).await?;
        order.transition_to(next)?;
        self.orders.update_status(&order).await?;
        Ok(order)
    }

    pub async fn delete(&self, id: OrderId) -> StoreResult<()> {
        self.orders.delete(id).await
    }

    pub async fn stats(&self) -> StoreResult<OrderStats> {
        self.orders.stats().await
    }
}
