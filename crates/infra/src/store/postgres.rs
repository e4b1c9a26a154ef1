//! Postgres store backend.
//!
//! All multi-table operations (cart save, redemption, checkout) run inside a
//! transaction; an early return drops the transaction and rolls everything
//! back. Unique violations surface as `DomainError::Conflict` via the
//! `StoreError` conversion, which is what checkout's retry loop keys on.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use storefront_cart::{AppliedCoupon, Cart, CartLine};
use storefront_catalog::{Brand, Category, Product, SpecMap};
use storefront_core::{
    AddressId, BrandId, CartId, CartLineId, CategoryId, CouponId, DomainError, OrderId, ProductId,
    SupportTicketId, UserId,
};
use storefront_coupons::Coupon;
use storefront_orders::{Order, OrderItem};
use storefront_pricing::{DiscountKind, DiscountRule};
use storefront_users::{Address, SupportTicket};

use crate::error::{StoreError, StoreResult};

use super::{
    AddressStore, CartStore, CatalogStore, CouponStore, OrderStats, OrderStore, SupportStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Shared Postgres connection pool and store constructors.
#[derive(Debug, Clone)]
pub struct PostgresStores {
    pool: PgPool,
}

impl PostgresStores {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the schema. Idempotent.
    pub async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn catalog(&self) -> PostgresCatalogStore {
        PostgresCatalogStore {
            pool: self.pool.clone(),
        }
    }

    pub fn carts(&self) -> PostgresCartStore {
        PostgresCartStore {
            pool: self.pool.clone(),
        }
    }

    pub fn coupons(&self) -> PostgresCouponStore {
        PostgresCouponStore {
            pool: self.pool.clone(),
        }
    }

    pub fn orders(&self) -> PostgresOrderStore {
        PostgresOrderStore {
            pool: self.pool.clone(),
        }
    }

    pub fn addresses(&self) -> PostgresAddressStore {
        PostgresAddressStore {
            pool: self.pool.clone(),
        }
    }

    pub fn support(&self) -> PostgresSupportStore {
        PostgresSupportStore {
            pool: self.pool.clone(),
        }
    }
}

// ─── row mapping ─────────────────────────────────────────────────────────────

fn discount_kind_str(kind: DiscountKind) -> &'static str {
    match kind {
        DiscountKind::Percentage => "percentage",
        DiscountKind::Fixed => "fixed",
    }
}

fn discount_kind_from_str(s: &str) -> StoreResult<DiscountKind> {
    match s {
        "percentage" => Ok(DiscountKind::Percentage),
        "fixed" => Ok(DiscountKind::Fixed),
        other => Err(StoreError::backend(format!(
            "unknown discount kind in row: {other}"
        ))),
    }
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let specs: Json<SpecMap> = row.try_get("specs")?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        brand_id: row
            .try_get::<Option<Uuid>, _>("brand_id")?
            .map(BrandId::from_uuid),
        category_id: row
            .try_get::<Option<Uuid>, _>("category_id")?
            .map(CategoryId::from_uuid),
        price: row.try_get("price")?,
        stock: row.try_get("stock")?,
        image_url: row.try_get("image_url")?,
        specs: specs.0,
    })
}

fn coupon_from_row(row: &PgRow) -> StoreResult<Coupon> {
    let kind: String = row.try_get("discount_kind")?;
    let rule = DiscountRule {
        kind: discount_kind_from_str(&kind)?,
        value: row.try_get("discount_value")?,
        max_discount: row.try_get("max_discount")?,
    };
    Ok(Coupon {
        id: CouponId::from_uuid(row.try_get("id")?),
        code: row.try_get("code")?,
        title: row.try_get("title")?,
        rule,
        min_purchase: row.try_get("min_purchase")?,
        valid_from: row.try_get("valid_from")?,
        valid_to: row.try_get("valid_to")?,
        max_uses: row
            .try_get::<Option<i32>, _>("max_uses")?
            .map(|v| v.max(0) as u32),
        used_count: row.try_get::<i32, _>("used_count")?.max(0) as u32,
        is_active: row.try_get("is_active")?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<OrderItem>) -> StoreResult<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        order_number: row.try_get("order_number")?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        address_id: row
            .try_get::<Option<Uuid>, _>("address_id")?
            .map(AddressId::from_uuid),
        items,
        subtotal: row.try_get("subtotal")?,
        discount: row.try_get("discount")?,
        total: row.try_get("total")?,
        coupon_id: row
            .try_get::<Option<Uuid>, _>("coupon_id")?
            .map(CouponId::from_uuid),
        status: status.parse().map_err(StoreError::Domain)?,
        created_at: row.try_get("created_at")?,
    })
}

// ─── catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO products \
             (id, name, description, brand_id, category_id, price, stock, image_url, specs) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.brand_id.map(|b| *b.as_uuid()))
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(Json(&product.specs))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE products SET name = $2, description = $3, brand_id = $4, \
             category_id = $5, price = $6, stock = $7, image_url = $8, specs = $9 \
             WHERE id = $1",
        )
        .bind(*product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.brand_id.map(|b| *b.as_uuid()))
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(Json(&product.specs))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("product").into());
        }
        Ok(())
    }

    async fn product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("product").into());
        }
        Ok(())
    }

    async fn insert_brand(&self, brand: &Brand) -> StoreResult<()> {
        sqlx::query("INSERT INTO brands (id, name, logo_url) VALUES ($1, $2, $3)")
            .bind(*brand.id.as_uuid())
            .bind(&brand.name)
            .bind(&brand.logo_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn brands(&self) -> StoreResult<Vec<Brand>> {
        let rows = sqlx::query("SELECT id, name, logo_url FROM brands ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Brand {
                    id: BrandId::from_uuid(row.try_get("id")?),
                    name: row.try_get("name")?,
                    logo_url: row.try_get("logo_url")?,
                })
            })
            .collect()
    }

    async fn delete_brand(&self, id: BrandId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM brands WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("brand").into());
        }
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(*category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: CategoryId::from_uuid(row.try_get("id")?),
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                })
            })
            .collect()
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("category").into());
        }
        Ok(())
    }
}

// ─── cart ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    async fn load(&self, id: CartId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query(
            "SELECT c.id, c.user_id, c.address_id, c.coupon_id, \
                    k.discount_kind, k.discount_value, k.max_discount \
             FROM carts c LEFT JOIN coupons k ON k.id = c.coupon_id \
             WHERE c.id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows = sqlx::query(
            "SELECT id, product_id, quantity, unit_price \
             FROM cart_items WHERE cart_id = $1 ORDER BY id",
        )
        .bind(*id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let lines = item_rows
            .iter()
            .map(|r| {
                Ok(CartLine {
                    id: CartLineId::from_uuid(r.try_get("id")?),
                    product_id: ProductId::from_uuid(r.try_get("product_id")?),
                    quantity: r.try_get("quantity")?,
                    unit_price: r.try_get("unit_price")?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let coupon = match row.try_get::<Option<Uuid>, _>("coupon_id")? {
            Some(coupon_id) => {
                let kind: Option<String> = row.try_get("discount_kind")?;
                match kind {
                    Some(kind) => Some(AppliedCoupon {
                        coupon_id: CouponId::from_uuid(coupon_id),
                        rule: DiscountRule {
                            kind: discount_kind_from_str(&kind)?,
                            value: row.try_get("discount_value")?,
                            max_discount: row.try_get("max_discount")?,
                        },
                    }),
                    // Coupon row gone (deleted); drop the attachment.
                    None => None,
                }
            }
            None => None,
        };

        Ok(Some(Cart::rehydrate(
            CartId::from_uuid(row.try_get("id")?),
            UserId::from_uuid(row.try_get("user_id")?),
            lines,
            coupon,
            row.try_get::<Option<Uuid>, _>("address_id")?
                .map(AddressId::from_uuid),
        )))
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn create_if_absent(&self, user_id: UserId) -> StoreResult<Cart> {
        // The unique constraint on user_id makes concurrent calls converge:
        // only one insert wins, everyone reads the surviving row.
        let candidate = Cart::new(user_id);
        sqlx::query("INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING")
            .bind(*candidate.id_typed().as_uuid())
            .bind(*user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        self.by_user(user_id)
            .await?
            .ok_or_else(|| StoreError::backend("cart row missing after upsert"))
    }

    async fn by_user(&self, user_id: UserId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query("SELECT id FROM carts WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => self.load(CartId::from_uuid(row.try_get("id")?)).await,
            None => Ok(None),
        }
    }

    async fn get(&self, id: CartId) -> StoreResult<Option<Cart>> {
        self.load(id).await
    }

    async fn by_line(&self, line_id: CartLineId) -> StoreResult<Option<Cart>> {
        let row = sqlx::query("SELECT cart_id FROM cart_items WHERE id = $1")
            .bind(*line_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => self.load(CartId::from_uuid(row.try_get("cart_id")?)).await,
            None => Ok(None),
        }
    }

    async fn save(&self, cart: &Cart) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO carts (id, user_id, coupon_id, address_id, subtotal, discount, total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
             coupon_id = EXCLUDED.coupon_id, address_id = EXCLUDED.address_id, \
             subtotal = EXCLUDED.subtotal, discount = EXCLUDED.discount, total = EXCLUDED.total",
        )
        .bind(*cart.id_typed().as_uuid())
        .bind(*cart.user_id().as_uuid())
        .bind(cart.coupon().map(|c| *c.coupon_id.as_uuid()))
        .bind(cart.address_id().map(|a| *a.as_uuid()))
        .bind(cart.subtotal())
        .bind(cart.discount())
        .bind(cart.total())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(*cart.id_typed().as_uuid())
            .execute(&mut *tx)
            .await?;

        for line in cart.lines() {
            sqlx::query(
                "INSERT INTO cart_items (id, cart_id, product_id, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(*line.id.as_uuid())
            .bind(*cart.id_typed().as_uuid())
            .bind(*line.product_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: CartId) -> StoreResult<()> {
        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// ─── coupons ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresCouponStore {
    pool: PgPool,
}

#[async_trait]
impl CouponStore for PostgresCouponStore {
    async fn insert(&self, coupon: &Coupon) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO coupons \
             (id, code, title, discount_kind, discount_value, max_discount, min_purchase, \
              valid_from, valid_to, max_uses, used_count, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(*coupon.id.as_uuid())
        .bind(&coupon.code)
        .bind(&coupon.title)
        .bind(discount_kind_str(coupon.rule.kind))
        .bind(coupon.rule.value)
        .bind(coupon.rule.max_discount)
        .bind(coupon.min_purchase)
        .bind(coupon.valid_from)
        .bind(coupon.valid_to)
        .bind(coupon.max_uses.map(|v| v as i32))
        .bind(coupon.used_count as i32)
        .bind(coupon.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, coupon: &Coupon) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE coupons SET title = $2, discount_kind = $3, discount_value = $4, \
             max_discount = $5, min_purchase = $6, valid_from = $7, valid_to = $8, \
             max_uses = $9, is_active = $10 \
             WHERE id = $1",
        )
        .bind(*coupon.id.as_uuid())
        .bind(&coupon.title)
        .bind(discount_kind_str(coupon.rule.kind))
        .bind(coupon.rule.value)
        .bind(coupon.rule.max_discount)
        .bind(coupon.min_purchase)
        .bind(coupon.valid_from)
        .bind(coupon.valid_to)
        .bind(coupon.max_uses.map(|v| v as i32))
        .bind(coupon.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("coupon").into());
        }
        Ok(())
    }

    async fn get(&self, id: CouponId) -> StoreResult<Option<Coupon>> {
        let row = sqlx::query("SELECT * FROM coupons WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(coupon_from_row).transpose()
    }

    async fn by_code(&self, code: &str) -> StoreResult<Option<Coupon>> {
        let row = sqlx::query("SELECT * FROM coupons WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(coupon_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Coupon>> {
        let rows = sqlx::query("SELECT * FROM coupons ORDER BY code")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(coupon_from_row).collect()
    }

    async fn has_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM coupon_usages WHERE coupon_id = $1 AND user_id = $2) AS used",
        )
        .bind(*coupon_id.as_uuid())
        .bind(*user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("used")?)
    }

    #[tracing::instrument(skip(self))]
    async fn record_usage(&self, coupon_id: CouponId, user_id: UserId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            "INSERT INTO coupon_usages (coupon_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(*coupon_id.as_uuid())
        .bind(*user_id.as_uuid())
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(DomainError::CouponAlreadyUsed.into());
        }

        // Re-check the cap under the row lock; a concurrent redemption may
        // have consumed the last use since eligibility was checked.
        let bumped = sqlx::query(
            "UPDATE coupons SET used_count = used_count + 1 \
             WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)",
        )
        .bind(*coupon_id.as_uuid())
        .execute(&mut *tx)
        .await?;
        if bumped.rows_affected() == 0 {
            return Err(DomainError::CouponLimitExceeded.into());
        }

        tx.commit().await?;
        Ok(())
    }
}

// ─── orders ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    async fn items_for(&self, order_id: OrderId) -> StoreResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, price FROM order_items WHERE order_id = $1",
        )
        .bind(*order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(OrderItem {
                    product_id: ProductId::from_uuid(r.try_get("product_id")?),
                    quantity: r.try_get("quantity")?,
                    price: r.try_get("price")?,
                })
            })
            .collect()
    }

    async fn with_items(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id = OrderId::from_uuid(row.try_get("id")?);
            let items = self.items_for(id).await?;
            orders.push(order_from_row(row, items)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_number = %order.order_number))]
    async fn materialize(&self, order: &Order, cart_id: CartId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Unique order_number: a collision aborts here, before any stock is
        // touched, and surfaces as Conflict for the caller's retry loop.
        sqlx::query(
            "INSERT INTO orders \
             (id, order_number, user_id, address_id, coupon_id, subtotal, discount, total, \
              status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(*order.id.as_uuid())
        .bind(&order.order_number)
        .bind(*order.user_id.as_uuid())
        .bind(order.address_id.map(|a| *a.as_uuid()))
        .bind(order.coupon_id.map(|c| *c.as_uuid()))
        .bind(order.subtotal)
        .bind(order.discount)
        .bind(order.total)
        .bind(order.status.to_string())
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(*order.id.as_uuid())
            .bind(*item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;

            // Conditional decrement: zero rows aborts the whole unit.
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2",
            )
            .bind(*item.product_id.as_uuid())
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                // Distinguish a vanished product from exhausted stock.
                let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
                    .bind(*item.product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await?;
                return Err(match exists {
                    Some(_) => DomainError::InsufficientStock.into(),
                    None => DomainError::not_found("product").into(),
                });
            }
        }

        sqlx::query("DELETE FROM carts WHERE id = $1")
            .bind(*cart_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let items = self.items_for(OrderId::from_uuid(row.try_get("id")?)).await?;
                Ok(Some(order_from_row(&row, items)?))
            }
            None => Ok(None),
        }
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(*user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        self.with_items(rows).await
    }

    async fn all(&self) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        self.with_items(rows).await
    }

    async fn update_status(&self, order: &Order) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(*order.id.as_uuid())
            .bind(order.status.to_string())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("order").into());
        }
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("order").into());
        }
        Ok(())
    }

    async fn stats(&self) -> StoreResult<OrderStats> {
        let totals = sqlx::query(
            "SELECT COUNT(*) AS total_orders, \
                    COALESCE(SUM(total) FILTER (WHERE status <> 'CANCELLED'), 0) AS total_revenue \
             FROM orders",
        )
        .fetch_one(&self.pool)
        .await?;

        let count_rows = sqlx::query("SELECT status, COUNT(*) AS n FROM orders GROUP BY status")
            .fetch_all(&self.pool)
            .await?;
        let mut status_counts = std::collections::BTreeMap::new();
        for row in &count_rows {
            let status: String = row.try_get("status")?;
            let n: i64 = row.try_get("n")?;
            status_counts.insert(status, n.max(0) as u64);
        }

        let recent_rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC LIMIT 5")
            .fetch_all(&self.pool)
            .await?;
        let recent = self.with_items(recent_rows).await?;

        let total_orders: i64 = totals.try_get("total_orders")?;
        Ok(OrderStats {
            total_orders: total_orders.max(0) as u64,
            total_revenue: totals.try_get::<Decimal, _>("total_revenue")?,
            status_counts,
            recent,
        })
    }
}

// ─── addresses ───────────────────────────────────────────────────────────────

fn address_from_row(row: &PgRow) -> StoreResult<Address> {
    Ok(Address {
        id: AddressId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        full_name: row.try_get("full_name")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        postal_code: row.try_get("postal_code")?,
        country: row.try_get("country")?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresAddressStore {
    pool: PgPool,
}

#[async_trait]
impl AddressStore for PostgresAddressStore {
    async fn insert(&self, address: &Address) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO addresses \
             (id, user_id, full_name, address, city, state, postal_code, country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*address.id.as_uuid())
        .bind(*address.user_id.as_uuid())
        .bind(&address.full_name)
        .bind(&address.address)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.postal_code)
        .bind(&address.country)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: AddressId) -> StoreResult<Option<Address>> {
        let row = sqlx::query("SELECT * FROM addresses WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(address_from_row).transpose()
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<Address>> {
        let rows = sqlx::query("SELECT * FROM addresses WHERE user_id = $1 ORDER BY id")
            .bind(*user_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(address_from_row).collect()
    }

    async fn delete(&self, id: AddressId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("address").into());
        }
        Ok(())
    }
}

// ─── support tickets ─────────────────────────────────────────────────────────

fn ticket_from_row(row: &PgRow) -> StoreResult<SupportTicket> {
    Ok(SupportTicket {
        id: SupportTicketId::from_uuid(row.try_get("id")?),
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        contact: row.try_get("contact")?,
        billing_name: row.try_get("billing_name")?,
        billing_date: row.try_get("billing_date")?,
        product_serial_no: row.try_get("product_serial_no")?,
        product_model_no: row.try_get("product_model_no")?,
        issue_type: row.try_get("issue_type")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresSupportStore {
    pool: PgPool,
}

#[async_trait]
impl SupportStore for PostgresSupportStore {
    async fn insert(&self, ticket: &SupportTicket) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO support_tickets \
             (id, user_id, contact, billing_name, billing_date, product_serial_no, \
              product_model_no, issue_type, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(*ticket.id.as_uuid())
        .bind(*ticket.user_id.as_uuid())
        .bind(&ticket.contact)
        .bind(&ticket.billing_name)
        .bind(ticket.billing_date)
        .bind(&ticket.product_serial_no)
        .bind(&ticket.product_model_no)
        .bind(&ticket.issue_type)
        .bind(ticket.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn for_user(&self, user_id: UserId) -> StoreResult<Vec<SupportTicket>> {
        let rows = sqlx::query(
            "SELECT * FROM support_tickets WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(*user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn all(&self) -> StoreResult<Vec<SupportTicket>> {
        let rows = sqlx::query("SELECT * FROM support_tickets ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(ticket_from_row).collect()
    }
}
