//! Service-level tests over the in-memory backend: the full shopper flow
//! (cart → coupon → checkout) and the failure paths the HTTP layer relies on.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use storefront_catalog::Product;
use storefront_core::{DomainError, UserId};
use storefront_coupons::Coupon;
use storefront_orders::OrderStatus;
use storefront_pricing::DiscountRule;

use storefront_users::Address;

use crate::services::{CartManager, CouponRedemption, OrderService};
use crate::store::memory::InMemoryStore;
use crate::store::{AddressStore, CatalogStore, CouponStore};

struct Services {
    store: InMemoryStore,
    carts: CartManager,
    redemption: CouponRedemption,
    orders: OrderService,
}

fn services() -> Services {
    let store = InMemoryStore::new();
    let shared = Arc::new(store.clone());
    Services {
        store,
        carts: CartManager::new(
            shared.clone(),
            shared.clone(),
            shared.clone(),
            shared.clone(),
        ),
        redemption: CouponRedemption::new(shared.clone()),
        orders: OrderService::new(shared.clone(), shared),
    }
}

fn dec(v: &str) -> Decimal {
    v.parse().unwrap()
}

async fn seed_product(store: &InMemoryStore, price: &str, stock: i64) -> Product {
    let product = Product::new("Widget", dec(price), stock).unwrap();
    store.insert_product(&product).await.unwrap();
    product
}

async fn seed_coupon(store: &InMemoryStore, code: &str, rule: DiscountRule) -> Coupon {
    let now = Utc::now();
    let coupon = Coupon::new(
        code,
        "Seeded",
        rule,
        None,
        now - Duration::days(1),
        now + Duration::days(1),
        None,
    )
    .unwrap();
    CouponStore::insert(store, &coupon).await.unwrap();
    coupon
}

#[tokio::test]
async fn cart_coupon_checkout_flow() {
    let svc = services();
    let product = seed_product(&svc.store, "100.00", 10).await;
    seed_coupon(&svc.store, "SAVE10", DiscountRule::percentage(dec("10"))).await;
    let user = UserId::new();

    let cart = svc.carts.add_item(user, product.id, 2).await.unwrap();
    assert_eq!(cart.subtotal(), dec("200.00"));

    let cart = svc.carts.apply_coupon(user, "SAVE10", Utc::now()).await.unwrap();
    assert_eq!(cart.discount(), dec("20.00"));
    assert_eq!(cart.total(), dec("180.00"));

    let order = svc.orders.checkout(user).await.unwrap();
    assert_eq!(order.total, dec("180.00"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.order_number.starts_with("ORD"));

    // Stock was decremented and the cart is gone.
    let stored = svc.store.product(product.id).await.unwrap().unwrap();
    assert_eq!(stored.stock, 8);
    assert!(svc.carts.get(user).await.unwrap().is_none());

    // The order is in the user's history.
    let history = svc.orders.for_user(user).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);
}

#[tokio::test]
async fn one_cart_per_user() {
    let svc = services();
    let user = UserId::new();

    let first = svc.carts.get_or_create(user).await.unwrap();
    let second = svc.carts.get_or_create(user).await.unwrap();
    assert_eq!(first.id_typed(), second.id_typed());
}

#[tokio::test]
async fn adding_unknown_product_is_not_found() {
    let svc = services();
    let err = svc
        .carts
        .add_item(UserId::new(), storefront_core::ProductId::new(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
}

#[tokio::test]
async fn adding_beyond_stock_is_rejected() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 3).await;

    let err = svc
        .carts
        .add_item(UserId::new(), product.id, 5)
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::InsufficientStock)
    ));
}

#[tokio::test]
async fn update_item_rechecks_current_stock() {
    let svc = services();
    let mut product = seed_product(&svc.store, "10.00", 10).await;
    let user = UserId::new();

    let cart = svc.carts.add_item(user, product.id, 2).await.unwrap();
    let line_id = cart.lines()[0].id;

    // Stock shrank since the line was added.
    product.stock = 3;
    svc.store.update_product(&product).await.unwrap();

    let err = svc.carts.update_item(user, line_id, 5).await.unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::InsufficientStock)
    ));

    let cart = svc.carts.update_item(user, line_id, 3).await.unwrap();
    assert_eq!(cart.lines()[0].quantity, 3);
}

#[tokio::test]
async fn foreign_cart_line_reads_as_missing() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 10).await;

    let owner = UserId::new();
    let cart = svc.carts.add_item(owner, product.id, 2).await.unwrap();
    let line_id = cart.lines()[0].id;

    // Another user probing the line id gets NotFound, not the owner's cart.
    let snoop = UserId::new();
    let err = svc.carts.update_item(snoop, line_id, 1).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
    let err = svc.carts.remove_item(snoop, line_id).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

    // The owner's line is untouched, and the owner can still mutate it.
    let cart = svc.carts.get(owner).await.unwrap().unwrap();
    assert_eq!(cart.lines()[0].quantity, 2);
    svc.carts.remove_item(owner, line_id).await.unwrap();
}

#[tokio::test]
async fn coupon_below_minimum_purchase_is_rejected() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 10).await;

    let now = Utc::now();
    let coupon = Coupon::new(
        "BIG50",
        "Big spender",
        DiscountRule::percentage(dec("50")),
        Some(dec("100.00")),
        now - Duration::days(1),
        now + Duration::days(1),
        None,
    )
    .unwrap();
    CouponStore::insert(&svc.store, &coupon).await.unwrap();

    let user = UserId::new();
    svc.carts.add_item(user, product.id, 2).await.unwrap();

    let err = svc
        .carts
        .apply_coupon(user, "BIG50", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::MinimumPurchaseNotMet(_))
    ));
}

#[tokio::test]
async fn unknown_coupon_code_is_invalid() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 10).await;
    let user = UserId::new();
    svc.carts.add_item(user, product.id, 1).await.unwrap();

    let err = svc
        .carts
        .apply_coupon(user, "NOPE", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::CouponInvalid)));
}

#[tokio::test]
async fn redeem_is_one_shot_per_user() {
    let svc = services();
    seed_coupon(
        &svc.store,
        "CAP15",
        DiscountRule::percentage(dec("50")).with_max_discount(dec("15")),
    )
    .await;
    let user = UserId::new();

    let quote = svc
        .redemption
        .redeem(user, "CAP15", dec("100.00"), Utc::now())
        .await
        .unwrap();
    assert_eq!(quote.discount, dec("15"));
    assert_eq!(quote.final_price, dec("85.00"));

    let err = svc
        .redemption
        .redeem(user, "CAP15", dec("100.00"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::CouponAlreadyUsed)
    ));

    // A different user still gets through.
    svc.redemption
        .redeem(UserId::new(), "CAP15", dec("100.00"), Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn redeem_rejects_non_positive_amount_without_consuming_the_use() {
    let svc = services();
    seed_coupon(&svc.store, "SAVE10", DiscountRule::percentage(dec("10"))).await;
    let user = UserId::new();

    let err = svc
        .redemption
        .redeem(user, "SAVE10", dec("-100"), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::InvalidInput(_))));

    let err = svc
        .redemption
        .redeem(user, "SAVE10", Decimal::ZERO, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::InvalidInput(_))));

    // The failed attempts did not burn the user's one-shot use.
    let quote = svc
        .redemption
        .redeem(user, "SAVE10", dec("100.00"), Utc::now())
        .await
        .unwrap();
    assert_eq!(quote.final_price, dec("90.00"));
}

#[tokio::test]
async fn cart_address_must_exist_and_belong_to_the_user() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 10).await;

    let user = UserId::new();
    svc.carts.add_item(user, product.id, 1).await.unwrap();

    // An id no store has ever seen.
    let err = svc
        .carts
        .set_address(user, Some(storefront_core::AddressId::new()))
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

    // Someone else's address is just as missing.
    let foreign = Address::new(
        UserId::new(),
        "Jordan Reyes",
        "12 Canal Road",
        "Lahore",
        "Punjab",
        "54000",
        "PK",
    )
    .unwrap();
    AddressStore::insert(&svc.store, &foreign).await.unwrap();
    let err = svc
        .carts
        .set_address(user, Some(foreign.id))
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

    // The user's own address sticks and flows into the order snapshot.
    let own = Address::new(
        user,
        "Jordan Reyes",
        "12 Canal Road",
        "Lahore",
        "Punjab",
        "54000",
        "PK",
    )
    .unwrap();
    AddressStore::insert(&svc.store, &own).await.unwrap();
    let cart = svc.carts.set_address(user, Some(own.id)).await.unwrap();
    assert_eq!(cart.address_id(), Some(own.id));

    let order = svc.orders.checkout(user).await.unwrap();
    assert_eq!(order.address_id, Some(own.id));
}

#[tokio::test]
async fn checkout_with_empty_cart_fails() {
    let svc = services();
    let user = UserId::new();
    svc.carts.get_or_create(user).await.unwrap();

    let err = svc.orders.checkout(user).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::CartEmpty)));
}

#[tokio::test]
async fn checkout_without_a_cart_is_not_found() {
    let svc = services();
    let err = svc.orders.checkout(UserId::new()).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
}

#[tokio::test]
async fn contended_stock_lets_only_one_checkout_through() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 3).await;

    let user_a = UserId::new();
    let user_b = UserId::new();
    svc.carts.add_item(user_a, product.id, 3).await.unwrap();
    svc.carts.add_item(user_b, product.id, 3).await.unwrap();

    svc.orders.checkout(user_a).await.unwrap();

    let err = svc.orders.checkout(user_b).await.unwrap_err();
    assert!(matches!(
        err.as_domain(),
        Some(DomainError::InsufficientStock)
    ));

    // The loser keeps their cart for a retry with a smaller quantity.
    assert!(svc.carts.get(user_b).await.unwrap().is_some());
    assert_eq!(svc.store.product(product.id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
async fn order_status_moves_through_the_lifecycle() {
    let svc = services();
    let product = seed_product(&svc.store, "10.00", 5).await;
    let user = UserId::new();
    svc.carts.add_item(user, product.id, 1).await.unwrap();
    let order = svc.orders.checkout(user).await.unwrap();

    let order = svc
        .orders
        .update_status(order.id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);

    // Skipping straight to Delivered is rejected and nothing is persisted.
    let err = svc
        .orders
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::InvalidInput(_))));
    assert_eq!(
        svc.orders.get(order.id).await.unwrap().status,
        OrderStatus::Processing
    );
}

#[tokio::test]
async fn delete_cart_is_idempotent() {
    let svc = services();
    let user = UserId::new();
    svc.carts.get_or_create(user).await.unwrap();

    svc.carts.delete_cart(user).await.unwrap();
    svc.carts.delete_cart(user).await.unwrap();
    assert!(svc.carts.get(user).await.unwrap().is_none());
}
