//! Delivery addresses.

use serde::{Deserialize, Serialize};

use storefront_core::{AddressId, DomainError, DomainResult, Entity, UserId};

/// A delivery address owned by a user.
///
/// Carts reference an address by id; checkout snapshots the id onto the
/// order. An address is only attachable to its owner's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    pub fn new(
        user_id: UserId,
        full_name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> DomainResult<Self> {
        let full_name = full_name.into();
        let address = address.into();
        let city = city.into();
        let state = state.into();
        let postal_code = postal_code.into();
        let country = country.into();

        for (field, value) in [
            ("full_name", &full_name),
            ("address", &address),
            ("city", &city),
            ("postal_code", &postal_code),
            ("country", &country),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::invalid_input(format!(
                    "address {field} must not be empty"
                )));
            }
        }

        Ok(Self {
            id: AddressId::new(),
            user_id,
            full_name,
            address,
            city,
            state,
            postal_code,
            country,
        })
    }
}

impl Entity for Address {
    type Id = AddressId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
