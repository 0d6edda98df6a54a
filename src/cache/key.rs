//! Tagged cache keys for the catalog views.
//!
//! A variant per view family keeps the bulk view and the per-product views
//! in separate namespaces, so key collisions across families are impossible
//! by construction (no string concatenation involved).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key for one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The bulk "all products" view.
    AllProducts,
    /// The per-product view for one identity.
    Product(i64),
}

impl CacheKey {
    /// The view family this key belongs to.
    pub fn family(&self) -> ViewKind {
        match self {
            CacheKey::AllProducts => ViewKind::AllProducts,
            CacheKey::Product(_) => ViewKind::Products,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::AllProducts => write!(f, "all-products"),
            CacheKey::Product(id) => write!(f, "product:{id}"),
        }
    }
}

/// A cacheable view family, as named in the cache policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    /// One entry holding every product.
    AllProducts,
    /// One entry per product.
    Products,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::AllProducts => write!(f, "all-products"),
            ViewKind::Products => write!(f, "products"),
        }
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-products" => Ok(ViewKind::AllProducts),
            "products" => Ok(ViewKind::Products),
            other => Err(format!("unknown cache view '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_kind_round_trips_through_names() {
        assert_eq!("all-products".parse::<ViewKind>(), Ok(ViewKind::AllProducts));
        assert_eq!("products".parse::<ViewKind>(), Ok(ViewKind::Products));
        assert!("product".parse::<ViewKind>().is_err());
        assert_eq!(ViewKind::AllProducts.to_string(), "all-products");
    }

    #[test]
    fn keys_map_to_their_family() {
        assert_eq!(CacheKey::AllProducts.family(), ViewKind::AllProducts);
        assert_eq!(CacheKey::Product(7).family(), ViewKind::Products);
        assert_eq!(CacheKey::Product(7).to_string(), "product:7");
    }
}
