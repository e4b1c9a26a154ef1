use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;

use storefront_core::CartLineId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/cart", get(get_cart).delete(delete_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/items/decrement", post(remove_by_product))
        .route("/cart/items/:line_id", put(update_item).delete(remove_item))
        .route("/cart/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/cart/address", put(set_address))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services.carts.get_or_create(user.user_id()).await {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "cart fetched", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services.carts.delete_cart(user.user_id()).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "cart deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::AddItemRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services
        .carts
        .add_item(user.user_id(), body.product_id, body.quantity)
        .await
    {
        Ok(cart) => errors::envelope_ok(StatusCode::CREATED, "item added to cart", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(line_id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }
    let line_id: CartLineId = match errors::parse_id(&line_id, "cart item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .carts
        .update_item(user.user_id(), line_id, body.quantity)
        .await
    {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "cart item updated", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(line_id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }
    let line_id: CartLineId = match errors::parse_id(&line_id, "cart item") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.carts.remove_item(user.user_id(), line_id).await {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "cart item removed", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove_by_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::RemoveByProductRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    // The cart id comes from the client; it must be the caller's own cart.
    match services.carts.get(user.user_id()).await {
        Ok(Some(cart)) if cart.id_typed() == body.cart_id => {}
        Ok(_) => {
            return errors::domain_error_to_response(storefront_core::DomainError::not_found(
                "cart",
            ));
        }
        Err(e) => return errors::store_error_to_response(e),
    }

    match services
        .carts
        .remove_by_product(body.cart_id, body.product_id, body.quantity)
        .await
    {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "cart item decremented", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn apply_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::ApplyCouponRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services
        .carts
        .apply_coupon(user.user_id(), &body.code, Utc::now())
        .await
    {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "coupon applied", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn remove_coupon(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services.carts.remove_coupon(user.user_id()).await {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "coupon removed", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn set_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::SetAddressRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "cart.manage") {
        return resp;
    }

    match services
        .carts
        .set_address(user.user_id(), body.address_id)
        .await
    {
        Ok(cart) => errors::envelope_ok(StatusCode::OK, "delivery address set", &cart),
        Err(e) => errors::store_error_to_response(e),
    }
}
