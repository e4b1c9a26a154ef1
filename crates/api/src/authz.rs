//! API-side authorization guard.
//!
//! Permissions are resolved from token roles per request; handlers call
//! `require` before touching any service, keeping domain and infra
//! auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use storefront_auth::{Permission, Principal, authorize, permissions_from_roles};

use crate::app::errors;
use crate::context::UserContext;

/// Check that the request's user holds the required permission.
///
/// Returns the ready-to-send `403` response on failure so handlers can
/// early-return it.
pub fn require(user: &UserContext, permission: &'static str) -> Result<(), Response> {
    let principal = Principal {
        user_id: user.user_id(),
        roles: user.roles().to_vec(),
        permissions: permissions_from_roles(user.roles()),
    };

    authorize(&principal, &Permission::new(permission))
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
