//! The catalog store boundary.
//!
//! The durable store is an external collaborator; this crate consumes it
//! through [`CatalogStore`] and never assumes anything about its engine
//! beyond the contract below. Every method is durable on return.

pub mod memory;

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::model::{PriceHistoryEntry, Product, ProductDraft};

pub use memory::MemoryStore;

/// Durable CRUD and ledger primitives for the product catalog.
///
/// Same-identity writes are serialized by the store's own concurrency
/// control; this crate adds no optimistic-concurrency checks of its own.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist a new product and return its store-assigned identity.
    async fn create(&self, draft: &ProductDraft) -> Result<i64, CatalogError>;

    async fn read_one(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    async fn read_all(&self) -> Result<Vec<Product>, CatalogError>;

    /// Replace the stored record. `Ok(false)` means the identity is absent.
    async fn update(&self, product: &Product) -> Result<bool, CatalogError>;

    /// Remove and return the record, or `None` if the identity is absent.
    /// Ledger rows for the identity are left in place.
    async fn delete(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    /// Append one row to the price ledger.
    async fn append_history(&self, entry: &PriceHistoryEntry) -> Result<(), CatalogError>;

    /// Ledger rows for one identity, in append order.
    async fn read_history(&self, id: i64) -> Result<Vec<PriceHistoryEntry>, CatalogError>;

    /// Every ledger row, in append order.
    async fn read_all_history(&self) -> Result<Vec<PriceHistoryEntry>, CatalogError>;
}
