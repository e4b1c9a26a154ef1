use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, DomainError, DomainResult, Entity};

/// A product brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub logo_url: Option<String>,
}

impl Brand {
    pub fn new(name: impl Into<String>, logo_url: Option<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("brand name must not be empty"));
        }
        Ok(Self {
            id: BrandId::new(),
            name,
            logo_url,
        })
    }
}

impl Entity for Brand {
    type Id = BrandId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
