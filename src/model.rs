//! Domain records for the product catalog.
//!
//! The catalog store owns the authoritative instances; the cache only ever
//! holds clones of these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A catalog product as stored and served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned, immutable once created.
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

/// Input for creating a product. Identity is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::invalid("product name must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(CatalogError::invalid(
                "product description must not be empty",
            ));
        }
        validate_price(self.price)
    }
}

/// Partial update for a product. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<u32>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
        {
            return Err(CatalogError::invalid("patch must set at least one field"));
        }
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::invalid("product name must not be empty"));
            }
        }
        if let Some(description) = &self.description {
            if description.trim().is_empty() {
                return Err(CatalogError::invalid(
                    "product description must not be empty",
                ));
            }
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Apply the patch in place. Returns whether the price actually changed,
    /// which decides whether a ledger entry is due.
    pub fn apply(&self, product: &mut Product) -> bool {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        let mut price_changed = false;
        if let Some(price) = self.price {
            price_changed = price != product.price;
            product.price = price;
        }
        price_changed
    }
}

/// One row of the append-only price ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryEntry {
    pub product_id: i64,
    pub price: f64,
    pub changed_at: DateTime<Utc>,
}

impl PriceHistoryEntry {
    pub fn now(product_id: i64, price: f64) -> Self {
        Self {
            product_id,
            price,
            changed_at: Utc::now(),
        }
    }
}

fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::invalid(
            "product price must be a non-negative number",
        ));
    }
    Ok(())
}
