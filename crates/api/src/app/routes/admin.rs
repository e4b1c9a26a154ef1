//! Admin order management: list everything, drive the lifecycle, stats.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, patch},
};

use storefront_core::OrderId;
use storefront_orders::OrderStatus;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/stats", get(order_stats))
        .route(
            "/admin/orders/:id",
            patch(update_order_status).delete(delete_order),
        )
        .route("/admin/support", get(list_support_tickets))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.read.all") {
        return resp;
    }

    match services.orders.all().await {
        Ok(orders) => errors::envelope_ok(StatusCode::OK, "orders listed", &orders),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.status.update") {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.orders.update_status(id, status).await {
        Ok(order) => errors::envelope_ok(StatusCode::OK, "order status updated", &order),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.delete") {
        return resp;
    }
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.orders.delete(id).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "order deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_support_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "support.read.all") {
        return resp;
    }

    match services.support.all().await {
        Ok(tickets) => errors::envelope_ok(StatusCode::OK, "support tickets listed", &tickets),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn order_stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "orders.stats") {
        return resp;
    }

    match services.orders.stats().await {
        Ok(stats) => errors::envelope_ok(StatusCode::OK, "order stats", &stats),
        Err(e) => errors::store_error_to_response(e),
    }
}
