//! Account surface: delivery addresses and support tickets.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::post,
};
use chrono::Utc;

use storefront_core::AddressId;
use storefront_users::{Address, SupportTicket};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/addresses", post(create_address).get(list_addresses))
        .route("/addresses/:id", axum::routing::delete(delete_address))
        .route("/support", post(create_ticket).get(list_own_tickets))
}

pub async fn create_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateAddressRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "profile.manage") {
        return resp;
    }

    let address = match Address::new(
        user.user_id(),
        body.full_name,
        body.address,
        body.city,
        body.state,
        body.postal_code,
        body.country,
    ) {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.addresses.insert(&address).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "address created", &address),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_addresses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "profile.manage") {
        return resp;
    }

    match services.addresses.for_user(user.user_id()).await {
        Ok(addresses) => errors::envelope_ok(StatusCode::OK, "addresses listed", &addresses),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_address(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "profile.manage") {
        return resp;
    }
    let id: AddressId = match errors::parse_id(&id, "address") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    // Only the owner may delete; a foreign id reads as missing.
    match services.addresses.get(id).await {
        Ok(Some(a)) if a.user_id == user.user_id() => {}
        Ok(_) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "address not found"),
        Err(e) => return errors::store_error_to_response(e),
    }

    match services.addresses.delete(id).await {
        Ok(()) => errors::envelope_ok(StatusCode::OK, "address deleted", serde_json::Value::Null),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<dto::CreateSupportRequest>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "profile.manage") {
        return resp;
    }

    let ticket = match SupportTicket::new(
        user.user_id(),
        body.contact,
        body.billing_name,
        body.billing_date,
        body.product_serial_no,
        body.product_model_no,
        body.issue_type,
        Utc::now(),
    ) {
        Ok(t) => t,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.support.insert(&ticket).await {
        Ok(()) => errors::envelope_ok(StatusCode::CREATED, "support ticket created", &ticket),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_own_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> axum::response::Response {
    if let Err(resp) = crate::authz::require(&user, "profile.manage") {
        return resp;
    }

    match services.support.for_user(user.user_id()).await {
        Ok(tickets) => errors::envelope_ok(StatusCode::OK, "support tickets listed", &tickets),
        Err(e) => errors::store_error_to_response(e),
    }
}
