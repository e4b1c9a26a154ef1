//! In-memory store backend.
//!
//! Intended for tests/dev. One `Mutex` guards the whole state, which is also
//! what makes multi-table operations (checkout, redemption) atomic here: the
//! lock is held for the full operation and mutations are applied only after
//! every check has passed.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;

use storefront_cart::Cart;
use storefront_catalog::{Brand, Category, Product};
use storefront_core::{
    AddressId, BrandId, CartId, CartLineId, CategoryId, CouponId, DomainError, Entity, OrderId,
    ProductId, SupportTicketId, UserId,
};
use storefront_coupons::Coupon;
use storefront_orders::Order;
use storefront_users::{Address, SupportTicket};

use crate::error::{StoreError, StoreResult};

use super::{
    AddressStore, CartStore, CatalogStore, CouponStore, OrderStats, OrderStore, SupportStore,
};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    brands: HashMap<BrandId, Brand>,
    categories: HashMap<CategoryId, Category>,
    carts: HashMap<CartId, Cart>,
    cart_by_user: HashMap<UserId, CartId>,
    coupons: HashMap<CouponId, Coupon>,
    coupon_by_code: HashMap<String, CouponId>,
    usages: HashSet<(CouponId, UserId)>,
    orders: HashMap<OrderId, Order>,
    order_numbers: HashSet<String>,
    addresses: HashMap<AddressId, Address>,
    tickets: HashMap<SupportTicketId, SupportTicket>,
}

/// In-memory backend implementing every store trait over shared state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::backend("state lock poisoned"))
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.products.insert(*product.id(), product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.lock()?;
        if !state.products.contains_key(product.id()) {
            return Err(DomainError::not_found("product").into());
        }
        state.products.insert(*product.id(), product.clone());
        Ok(())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let state = self.lock()?;
        let mut all: Vec<Product> = state.products.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.brands.insert(*brand.id(), brand.clone());
        Ok(())
    }

    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        let state = self.lock()?;
        let mut all: Vec<Brand> = state.brands.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete_brand(&self, id: BrandId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state
            .brands
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("brand").into())
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.categories.insert(*category.id(), category.clone());
        Ok(())
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let state = self.lock()?;
        let mut all: Vec<Category> = state.categories.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state
            .categories
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("category").into())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn create_if_absent(&self, user_id: UserId) -> StoreResult<Cart> {
        let mut state = self.lock()?;
        if let Some(cart_id) = state.cart_by_user.get(&user_id) {
            if let Some(cart) = state.carts.get(cart_id) {
                return Ok(cart.clone());
            }
        }

        let cart = Cart::new(user_id);
        state.cart_by_user.insert(user_id, cart.id_typed());
        state.carts.insert(cart.id_typed(), cart.clone());
        Ok(cart)
    }

    async fn by_user(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        let state = self.lock()?;
        Ok(state
            .cart_by_user
            .get(&user_id)
            .and_then(|id| state.carts.get(id))
            .cloned())
    }

    async fn get(&self, id: CartId) -> StoreResult<Option<Cart>> {
        Ok(self.lock()?.carts.get(&id).cloned())
    }

    async fn by_line(&self, line_id: CartLineId) -> StoreResult<Option<Cart>> {
        let state = self.lock()?;
        Ok(state
            .carts
            .values()
            .find(|c| c.line(line_id).is_some())
            .cloned())
    }

    async fn save(&self, cart: &Cart) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.cart_by_user.insert(cart.user_id(), cart.id_typed());
        state.carts.insert(cart.id_typed(), cart.clone());
        Ok(())
    }

    async fn delete(&self, id: CartId) -> StoreResult<()> {
        let mut state = self.lock()?;
        if let Some(cart) = state.carts.remove(&id) {
            state.cart_by_user.remove(&cart.user_id());
        }
        Ok(())
    }
}

#[async_trait]
impl CouponStore for InMemoryStore {
    async fn insert(&self, coupon: &Coupon) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.coupon_by_code.contains_key(&coupon.code) {
            return Err(DomainError::conflict(format!(
                "coupon code '{}' already exists",
                coupon.code
            ))
            .into());
        }
        state.coupon_by_code.insert(coupon.code.clone(), coupon.id);
        state.coupons.insert(coupon.id, coupon.clone());
        Ok(())
    }

    async fn update(&self, coupon: &Coupon) -> StoreResult<()> {
        let mut state = self.lock()?;
        let existing = state
            .coupons
            .get(&coupon.id)
            .ok_or(DomainError::not_found("coupon"))?;

        // used_count is owned by record_usage.
        let mut updated = coupon.clone();
        updated.used_count = existing.used_count;

        state.coupons.insert(updated.id, updated);
        Ok(())
    }

    async fn get(&self, id: CouponId) -> StoreResult<Option<Coupon>> {
        Ok(self.lock()?.coupons.get(&id).cloned())
    }

    async fn by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        let state = self.lock()?;
        Ok(state
            .coupon_by_code
            .get(code)
            .and_then(|id| state.coupons.get(id))
            .cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Coupon>> {
        let state = self.lock()?;
        let mut all: Vec<Coupon> = state.coupons.values().cloned().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(all)
    }

    async fn has_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.lock()?.usages.contains(&(coupon_id, user_id)))
    }

    async fn record_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()> {
        let mut state = self.lock()?;

        if state.usages.contains(&(coupon_id, user_id)) {
            return Err(DomainError::CouponAlreadyUsed.into());
        }

        let coupon = state
            .coupons
            .get_mut(&coupon_id)
            .ok_or(DomainError::not_found("coupon"))?;
        if !coupon.has_uses_remaining() {
            return Err(DomainError::CouponLimitExceeded.into());
        }

        coupon.used_count += 1;
        state.usages.insert((coupon_id, user_id));
        Ok(())
    }
}

#[async_trait]
impl AddressStore for InMemoryStore {
    async fn insert(&self, address: &Address) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.addresses.insert(address.id, address.clone());
        Ok(())
    }

    async fn get(&self, id: AddressId) -> StoreResult<Option<Address>> {
        Ok(self.lock()?.addresses.get(&id).cloned())
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Address>> {
        let state = self.lock()?;
        let mut all: Vec<Address> = state
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        // AddressId is time-ordered, so this is insertion order.
        all.sort_by_key(|a| *a.id.as_uuid());
        Ok(all)
    }

    async fn delete(&self, id: AddressId) -> StoreResult<()> {
        let mut state = self.lock()?;
        state
            .addresses
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("address").into())
    }
}

#[async_trait]
impl SupportStore for InMemoryStore {
    async fn insert(&self, ticket: &SupportTicket) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<SupportTicket>> {
        let state = self.lock()?;
        let mut all: Vec<SupportTicket> = state
            .tickets
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn all(&self) -> StoreResult<Vec<SupportTicket>> {
        let state = self.lock()?;
        let mut all: Vec<SupportTicket> = state.tickets.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn materialize(&self, order: &Order, cart_id: CartId) -> StoreResult<()> {
        let mut state = self.lock()?;

        if state.order_numbers.contains(&order.order_number) {
            return Err(DomainError::conflict(format!(
                "order number '{}' already exists",
                order.order_number
            ))
            .into());
        }

        // Validate everything before touching any state.
        for item in &order.items {
            let product = state
                .products
                .get(&item.product_id)
                .ok_or(DomainError::not_found("product"))?;
            if product.stock < item.quantity {
                return Err(DomainError::InsufficientStock.into());
            }
        }

        for item in &order.items {
            if let Some(product) = state.products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }

        state.order_numbers.insert(order.order_number.clone());
        state.orders.insert(order.id, order.clone());

        if let Some(cart) = state.carts.remove(&cart_id) {
            state.cart_by_user.remove(&cart.user_id());
        }
        Ok(())
    }

    async fn get(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.lock()?.orders.get(&id).cloned())
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn all(&self) -> StoreResult<Vec<Order>> {
        let state = self.lock()?;
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn update_status(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.lock()?;
        let stored = state
            .orders
            .get_mut(&order.id)
            .ok_or(DomainError::not_found("order"))?;
        stored.status = order.status;
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> StoreResult<()> {
        let mut state = self.lock()?;
        let removed = state
            .orders
            .remove(&id)
            .ok_or(DomainError::not_found("order"))?;
        state.order_numbers.remove(&removed.order_number);
        Ok(())
    }

    async fn stats(&self) -> StoreResult<OrderStats> {
        let state = self.lock()?;

        let mut status_counts = std::collections::BTreeMap::new();
        let mut total_revenue = Decimal::ZERO;
        for order in state.orders.values() {
            *status_counts.entry(order.status.to_string()).or_insert(0) += 1;
            if order.status != storefront_orders::OrderStatus::Cancelled {
                total_revenue += order.total;
            }
        }

        let mut recent: Vec<Order> = state.orders.values().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(5);

        Ok(OrderStats {
            total_orders: state.orders.len() as u64,
            total_revenue,
            status_counts,
            recent,
        })
    }
}
