//! Cart orchestration.
//!
//! Every mutation follows the same shape: load the aggregate, mutate it
//! (which recomputes totals), persist the whole cart. Stock bounds are
//! checked against the product's current stock at mutation time; the final
//! authoritative check happens at checkout.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use storefront_cart::Cart;
use storefront_core::{AddressId, CartId, CartLineId, DomainError, ProductId, UserId};
use storefront_coupons::{UserUsage, check_eligibility};

use crate::error::StoreResult;
use crate::store::{AddressStore, CartStore, CatalogStore, CouponStore};

pub struct CartManager {
    carts: Arc<dyn CartStore>,
    catalog: Arc<dyn CatalogStore>,
    coupons: Arc<dyn CouponStore>,
    addresses: Arc<dyn AddressStore>,
}

impl CartManager {
    pub fn new(
        carts: Arc<dyn CartStore>,
        catalog: Arc<dyn CatalogStore>,
        coupons: Arc<dyn CouponStore>,
        addresses: Arc<dyn AddressStore>,
    ) -> Self {
        Self {
            carts,
            catalog,
            coupons,
            addresses,
        }
    }

    /// Return the user's cart, creating an empty one on first access.
    pub async fn get_or_create(&self, user_id: UserId) -> StoreResult<Cart> {
        self.carts.create_if_absent(user_id).await
    }

    /// Add a product to the user's cart, or replace the quantity of its
    /// existing line. The unit price is snapshotted from the product.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> StoreResult<Cart> {
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or(DomainError::not_found("product"))?;

        let mut cart = self.carts.create_if_absent(user_id).await?;
        cart.put_line(product_id, product.price, quantity, product.stock)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Replace a line's quantity, re-checking the product's current stock.
    ///
    /// The line must belong to the caller's cart; a foreign line id reads the
    /// same as a missing one.
    pub async fn update_item(
        &self,
        user_id: UserId,
        line_id: CartLineId,
        quantity: i64,
    ) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .by_line(line_id)
            .await?
            .filter(|c| c.user_id() == user_id)
            .ok_or(DomainError::not_found("cart item"))?;

        let product_id = cart
            .line(line_id)
            .map(|l| l.product_id)
            .ok_or(DomainError::not_found("cart item"))?;
        let product = self
            .catalog
            .product(product_id)
            .await?
            .ok_or(DomainError::not_found("product"))?;

        cart.set_line_quantity(line_id, quantity, product.stock)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Delete a line outright. Same ownership rule as `update_item`.
    pub async fn remove_item(&self, user_id: UserId, line_id: CartLineId) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .by_line(line_id)
            .await?
            .filter(|c| c.user_id() == user_id)
            .ok_or(DomainError::not_found("cart item"))?;

        cart.remove_line(line_id)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Decrement a product's line in the given cart, removing the line when
    /// the remaining quantity reaches zero.
    pub async fn remove_by_product(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .get(cart_id)
            .await?
            .ok_or(DomainError::not_found("cart"))?;

        cart.decrement_product(product_id, quantity)?;
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Attach a coupon to the user's cart after the eligibility checks.
    ///
    /// Per-user usage is not consumed here; applying to a cart is free and
    /// reversible. The one-shot redemption flow is `CouponRedemption`.
    pub async fn apply_coupon(
        &self,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .by_user(user_id)
            .await?
            .ok_or(DomainError::not_found("cart"))?;

        let coupon = self
            .coupons
            .by_code(code)
            .await?
            .ok_or(DomainError::CouponInvalid)?;

        check_eligibility(&coupon, now, UserUsage::NotTracked, cart.subtotal())?;

        cart.attach_coupon(coupon.id, coupon.rule);
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Detach the cart's coupon, restoring the undiscounted total.
    pub async fn remove_coupon(&self, user_id: UserId) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .by_user(user_id)
            .await?
            .ok_or(DomainError::not_found("cart"))?;

        cart.detach_coupon();
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    /// Set or clear the delivery address used at checkout.
    ///
    /// The address must exist and belong to the cart's owner, so orders never
    /// snapshot a dangling or foreign reference.
    pub async fn set_address(
        &self,
        user_id: UserId,
        address_id: Option<AddressId>,
    ) -> StoreResult<Cart> {
        let mut cart = self
            .carts
            .by_user(user_id)
            .await?
            .ok_or(DomainError::not_found("cart"))?;

        if let Some(id) = address_id {
            self.addresses
                .get(id)
                .await?
                .filter(|a| a.user_id == user_id)
                .ok_or(DomainError::not_found("address"))?;
        }

        cart.set_address(address_id);
        self.carts.save(&cart).await?;
        Ok(cart)
    }

    pub async fn get(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        self.carts.by_user(user_id).await
    }

    /// Delete the user's cart if one exists. Idempotent.
    pub async fn delete_cart(&self, user_id: UserId) -> StoreResult<()> {
        if let Some(cart) = self.carts.by_user(user_id).await? {
            self.carts.delete(cart.id_typed()).await?;
        }
        Ok(())
    }
}
