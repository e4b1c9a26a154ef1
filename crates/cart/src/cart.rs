use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{
    AddressId, CartId, CartLineId, CouponId, DomainError, DomainResult, Entity, ProductId, UserId,
};
use storefront_pricing::{DiscountRule, discount_for};

/// A single line item: product, quantity, unit price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub quantity: i64,
    /// Unit price captured at the time of the last mutation; subtotal math
    /// uses this, not a live product lookup.
    pub unit_price: Decimal,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Coupon attachment: id plus the rule needed to recompute the discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub coupon_id: CouponId,
    pub rule: DiscountRule,
}

/// Aggregate root: a user's single active cart.
///
/// # Invariants
/// - `total = subtotal − discount` after every mutation.
/// - `discount ∈ [0, subtotal]`.
/// - Line quantities are positive and were stock-bounded at mutation time.
/// - At most one line per product (re-adding replaces the quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    id: CartId,
    user_id: UserId,
    lines: Vec<CartLine>,
    subtotal: Decimal,
    discount: Decimal,
    total: Decimal,
    coupon: Option<AppliedCoupon>,
    address_id: Option<AddressId>,
}

impl Cart {
    /// Create an empty cart for a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            coupon: None,
            address_id: None,
        }
    }

    /// Rebuild a cart from stored state.
    ///
    /// Totals are recomputed from the lines and coupon rather than trusted
    /// from storage, so a rehydrated cart satisfies the same invariants as a
    /// freshly mutated one.
    pub fn rehydrate(
        id: CartId,
        user_id: UserId,
        lines: Vec<CartLine>,
        coupon: Option<AppliedCoupon>,
        address_id: Option<AddressId>,
    ) -> Self {
        let mut cart = Self {
            id,
            user_id,
            lines,
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            coupon,
            address_id,
        };
        cart.recompute_totals();
        cart
    }

    pub fn id_typed(&self) -> CartId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    pub fn address_id(&self) -> Option<AddressId> {
        self.address_id
    }

    pub fn set_address(&mut self, address_id: Option<AddressId>) {
        self.address_id = address_id;
    }

    pub fn line(&self, line_id: CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    /// Add a product, or replace the quantity of its existing line.
    ///
    /// `available_stock` is the product's stock at mutation time; the new
    /// quantity must not exceed it.
    pub fn put_line(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: i64,
        available_stock: i64,
    ) -> DomainResult<CartLineId> {
        Self::check_quantity(quantity, available_stock)?;

        let line_id = match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                // Merge by replacing, not adding.
                line.quantity = quantity;
                line.unit_price = unit_price;
                line.id
            }
            None => {
                let line = CartLine {
                    id: CartLineId::new(),
                    product_id,
                    quantity,
                    unit_price,
                };
                let id = line.id;
                self.lines.push(line);
                id
            }
        };

        self.recompute_totals();
        Ok(line_id)
    }

    /// Replace a line's quantity in place.
    pub fn set_line_quantity(
        &mut self,
        line_id: CartLineId,
        quantity: i64,
        available_stock: i64,
    ) -> DomainResult<()> {
        Self::check_quantity(quantity, available_stock)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or(DomainError::not_found("cart item"))?;
        line.quantity = quantity;

        self.recompute_totals();
        Ok(())
    }

    /// Delete a line outright.
    pub fn remove_line(&mut self, line_id: CartLineId) -> DomainResult<CartLine> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or(DomainError::not_found("cart item"))?;
        let removed = self.lines.remove(idx);

        self.recompute_totals();
        Ok(removed)
    }

    /// Decrement a product's line by `quantity`, deleting it when the
    /// remaining quantity would reach zero.
    pub fn decrement_product(&mut self, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::invalid_input(
                "quantity must be greater than zero",
            ));
        }

        let idx = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or(DomainError::not_found("cart item"))?;

        if self.lines[idx].quantity <= quantity {
            self.lines.remove(idx);
        } else {
            self.lines[idx].quantity -= quantity;
        }

        self.recompute_totals();
        Ok(())
    }

    /// Attach a validated coupon and recompute the discount.
    ///
    /// Eligibility checking happens before this call; the aggregate only
    /// stores the attachment and keeps totals consistent.
    pub fn attach_coupon(&mut self, coupon_id: CouponId, rule: DiscountRule) {
        self.coupon = Some(AppliedCoupon { coupon_id, rule });
        self.recompute_totals();
    }

    pub fn detach_coupon(&mut self) {
        self.coupon = None;
        self.recompute_totals();
    }

    fn check_quantity(quantity: i64, available_stock: i64) -> DomainResult<()> {
        if quantity <= 0 {
            return Err(DomainError::invalid_input(
                "quantity must be greater than zero",
            ));
        }
        if quantity > available_stock {
            return Err(DomainError::InsufficientStock);
        }
        Ok(())
    }

    /// Re-establish `total = subtotal − discount` from the current line set
    /// and attached coupon. Every mutating operation ends here.
    fn recompute_totals(&mut self) {
        self.subtotal = self
            .lines
            .iter()
            .fold(Decimal::ZERO, |acc, l| acc + l.line_total());

        self.discount = match &self.coupon {
            Some(applied) => discount_for(self.subtotal, &applied.rule),
            None => Decimal::ZERO,
        };

        self.total = self.subtotal - self.discount;
    }
}

impl Entity for Cart {
    type Id = CartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
