use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{BrandId, CategoryId, DomainError, DomainResult, Entity, ProductId};

/// Open key/value product specification map.
///
/// Values are free-form scalars (strings, numbers, booleans), validated on
/// write and read back permissively through typed accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpecMap(BTreeMap<String, serde_json::Value>);

impl SpecMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a spec entry; only scalar JSON values are accepted.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) -> DomainResult<()> {
        if value.is_object() || value.is_array() {
            return Err(DomainError::invalid_input(
                "spec values must be scalar (string, number or boolean)",
            ));
        }
        self.0.insert(key.into(), value);
        Ok(())
    }

    /// Build from a raw JSON map, rejecting non-scalar values.
    pub fn from_raw(raw: BTreeMap<String, serde_json::Value>) -> DomainResult<Self> {
        let mut specs = Self::new();
        for (k, v) in raw {
            specs.set(k, v)?;
        }
        Ok(specs)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn get_number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(|v| v.as_bool())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }
}

/// A sellable product.
///
/// `stock` is the single contended resource in the checkout flow; it is only
/// decremented at order materialization, never by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub price: Decimal,
    pub stock: i64,
    pub image_url: Option<String>,
    pub specs: SpecMap,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        stock: i64,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("product name must not be empty"));
        }
        if price < Decimal::ZERO {
            return Err(DomainError::invalid_input("price must not be negative"));
        }
        if stock < 0 {
            return Err(DomainError::invalid_input("stock must not be negative"));
        }

        Ok(Self {
            id: ProductId::new(),
            name,
            description: None,
            brand_id: None,
            category_id: None,
            price,
            stock,
            image_url: None,
            specs: SpecMap::new(),
        })
    }

    pub fn with_specs(mut self, specs: SpecMap) -> Self {
        self.specs = specs;
        self
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(v: &str) -> Decimal {
        v.parse().unwrap()
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = Product::new("Widget", dec("-1"), 10).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn negative_stock_is_rejected() {
        let err = Product::new("Widget", dec("1"), -1).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn spec_map_accepts_scalars_and_rejects_nesting() {
        let mut specs = SpecMap::new();
        specs.set("color", json!("red")).unwrap();
        specs.set("weight_kg", json!(1.5)).unwrap();
        specs.set("wireless", json!(true)).unwrap();

        assert_eq!(specs.get_str("color"), Some("red"));
        assert_eq!(specs.get_number("weight_kg"), Some(1.5));
        assert_eq!(specs.get_bool("wireless"), Some(true));

        let err = specs.set("dims", json!({"w": 1})).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn spec_map_reads_are_permissive_on_type_mismatch() {
        let mut specs = SpecMap::new();
        specs.set("color", json!(42)).unwrap();
        // Wrong-typed read yields None rather than an error.
        assert_eq!(specs.get_str("color"), None);
        assert_eq!(specs.get_number("color"), Some(42.0));
    }
}
