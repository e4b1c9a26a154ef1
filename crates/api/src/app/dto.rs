//! Request DTOs.
//!
//! Ids arrive as UUID strings and deserialize straight into the typed ids.
//! Money arrives as decimal strings (`"19.99"`), matching how it is
//! serialized back out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use storefront_core::{AddressId, BrandId, CategoryId, ProductId};

// -------------------------
// Cart
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveByProductRequest {
    pub cart_id: storefront_core::CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAddressRequest {
    pub address_id: Option<AddressId>,
}

// -------------------------
// Account
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateAddressRequest {
    pub full_name: String,
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupportRequest {
    pub contact: String,
    pub billing_name: String,
    pub billing_date: DateTime<Utc>,
    pub product_serial_no: String,
    pub product_model_no: String,
    pub issue_type: String,
}

// -------------------------
// Coupons
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RedeemCouponRequest {
    pub code: String,
    pub order_amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    pub code: String,
    pub title: String,
    /// "percentage" or "fixed".
    pub discount_kind: String,
    pub discount_value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_purchase: Option<Decimal>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub max_uses: Option<u32>,
}

// -------------------------
// Orders
// -------------------------

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

// -------------------------
// Catalog
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub stock: i64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub specs: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub image_url: Option<String>,
    pub specs: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}
