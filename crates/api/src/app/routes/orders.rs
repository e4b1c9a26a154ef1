use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
};

use storefront_core::{DomainError, OrderId};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", get(list_own_orders))
        .route("/orders/:id", get(get_order))
}

pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.checkout") {
        return resp;
    }

    match services.orders.checkout(user.user_id()).await {
        Ok(order) => errors::envelope_ok(StatusCode::CREATED, "order created", &order),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_own_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.read.own") {
        return resp;
    }

    match services.orders.for_user(user.user_id()).await {
        Ok(orders) => errors::envelope_ok(StatusCode::OK, "orders listed", &orders),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.read.own") {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.get(id).await {
        Ok(order) => {
            // Customers only see their own orders; a foreign id reads as
            // absent rather than forbidden.
            if order.user_id != user.user_id() && !user.is_admin() {
                return errors::domain_error_to_response(DomainError::not_found("order"));
            }
            errors::envelope_ok(StatusCode::OK, "order fetched", &order)
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
