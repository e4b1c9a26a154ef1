use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::UserId;

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "orders.status.update").
/// The wildcard permission `"*"` means "allow all".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Role→permission policy.
///
/// `admin` grants everything; `customer` grants the shopper surface (own
/// cart, coupons, checkout, own orders).
pub fn permissions_from_roles(roles: &[Role]) -> Vec<Permission> {
    if roles.iter().any(Role::is_admin) {
        return vec![Permission::new("*")];
    }

    if roles.iter().any(|r| r.as_str() == "customer") {
        return vec![
            Permission::new("cart.manage"),
            Permission::new("coupons.redeem"),
            Permission::new("orders.checkout"),
            Permission::new("orders.read.own"),
            Permission::new("profile.manage"),
        ];
    }

    Vec::new()
}

/// Authorize a principal for a required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(roles: Vec<Role>) -> Principal {
        let permissions = permissions_from_roles(&roles);
        Principal {
            user_id: UserId::new(),
            roles,
            permissions,
        }
    }

    #[test]
    fn admin_wildcard_grants_everything() {
        let p = principal(vec![Role::admin()]);
        assert!(authorize(&p, &Permission::new("orders.status.update")).is_ok());
        assert!(authorize(&p, &Permission::new("cart.manage")).is_ok());
    }

    #[test]
    fn customer_can_manage_cart_but_not_admin_surface() {
        let p = principal(vec![Role::customer()]);
        assert!(authorize(&p, &Permission::new("cart.manage")).is_ok());
        assert!(authorize(&p, &Permission::new("profile.manage")).is_ok());
        assert!(matches!(
            authorize(&p, &Permission::new("orders.status.update")),
            Err(AuthzError::Forbidden(_))
        ));
    }

    #[test]
    fn unknown_role_gets_nothing() {
        let p = principal(vec![Role::new("viewer")]);
        assert!(matches!(
            authorize(&p, &Permission::new("cart.manage")),
            Err(AuthzError::Forbidden(_))
        ));
    }
}
