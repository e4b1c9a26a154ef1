//! Catalog management: products, brands, categories.
//!
//! Reads are open to any authenticated user; writes need the admin-only
//! `catalog.manage` permission.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
};

use storefront_catalog::{Brand, Category, Product, SpecMap};
use storefront_core::{BrandId, CategoryId, DomainError, ProductId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/products", post(create_product).get(list_products))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/brands", post(create_brand).get(list_brands))
        .route("/brands/:id", axum::routing::delete(delete_brand))
        .route("/categories", post(create_category).get(list_categories))
        .route("/categories/:id", axum::routing::delete(delete_category))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }

    let specs = match SpecMap::from_raw(body.specs) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let mut product = match Product::new(body.name, body.price, body.stock) {
        Ok(p) => p.with_specs(specs),
        Err(e) => return errors::domain_error_to_response(e),
    };
    product.description = body.description;
    product.brand_id = body.brand_id;
    product.category_id = body.category_id;
    product.image_url = body.image_url;

    match services.catalog.insert_product(&product).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "product created", &product),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_user): Extension<UserContext>,
) -> axum::response::Response {
    match services.catalog.products().await {
        Ok(products) => errors::envelope_ok(StatusCode::OK, "products listed", &products),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.product(id).await {
        Ok(Some(product)) => errors::envelope_ok(StatusCode::OK, "product fetched", &product),
        Ok(None) => errors::domain_error_to_response(DomainError::not_found("product")),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut product = match services.catalog.product(id).await {
        Ok(Some(p)) => p,
        Ok(None) => return errors::domain_error_to_response(DomainError::not_found("product")),
        Err(e) => return errors::store_error_to_response(e),
    };

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(stock) = body.stock {
        product.stock = stock;
    }
    if body.description.is_some() {
        product.description = body.description;
    }
    if body.brand_id.is_some() {
        product.brand_id = body.brand_id;
    }
    if body.category_id.is_some() {
        product.category_id = body.category_id;
    }
    if body.image_url.is_some() {
        product.image_url = body.image_url;
    }
    if let Some(raw) = body.specs {
        product.specs = match SpecMap::from_raw(raw) {
            Ok(s) => s,
            Err(e) => return errors::domain_error_to_response(e),
        };
    }

    if let Err(e) = validate_product(&product) {
        return errors::domain_error_to_response(e);
    }

    match services.catalog.update_product(&product).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "product updated", &product),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_product(id).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "product deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}

fn validate_product(product: &Product) -> Result<(), DomainError> {
    if product.name.trim().is_empty() {
        return Err(DomainError::invalid_input("product name must not be empty"));
    }
    if product.price < rust_decimal::Decimal::ZERO {
        return Err(DomainError::invalid_input("price must not be negative"));
    }
    if product.stock < 0 {
        return Err(DomainError::invalid_input("stock must not be negative"));
    }
    Ok(())
}

pub async fn create_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateBrandRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }

    let brand = match Brand::new(body.name, body.logo_url) {
        Ok(b) => b,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.insert_brand(&brand).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "brand created", &brand),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_brands(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_user): Extension<UserContext>,
) -> axum::response::Response {
    match services.catalog.brands().await {
        Ok(brands) => errors::envelope_ok(StatusCode::OK, "brands listed", &brands),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }
    let id: BrandId = match errors::parse_id(&id, "brand") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_brand(id).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "brand deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }

    let category = match Category::new(body.name, body.description) {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.catalog.insert_category(&category).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "category created", &category),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(_user): Extension<UserContext>,
) -> axum::response::Response {
    match services.catalog.categories().await {
        Ok(categories) => errors::envelope_ok(StatusCode::OK, "categories listed", &categories),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "catalog.manage") {
        return resp;
    }
    let id: CategoryId = match errors::parse_id(&id, "category") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.catalog.delete_category(id).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "category deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}
