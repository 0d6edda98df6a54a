//! In-memory [`CatalogStore`] for development and tests.
//!
//! Counts its read calls so tests can assert whether a request was served
//! from cache or hit the store, and can be switched into a failing state to
//! exercise the unavailable-store paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CatalogError;
use crate::model::{PriceHistoryEntry, Product, ProductDraft};
use crate::store::CatalogStore;

#[derive(Default)]
pub struct MemoryStore {
    products: RwLock<BTreeMap<i64, Product>>,
    history: RwLock<Vec<PriceHistoryEntry>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
    read_all_calls: AtomicU64,
    read_one_calls: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Seed the store with existing products, without ledger rows.
    pub async fn with_products(products: Vec<Product>) -> Self {
        let store = Self::new();
        {
            let mut map = store.products.write().await;
            for product in products {
                store
                    .next_id
                    .fetch_max(product.id + 1, Ordering::SeqCst);
                map.insert(product.id, product);
            }
        }
        store
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn read_all_calls(&self) -> u64 {
        self.read_all_calls.load(Ordering::SeqCst)
    }

    pub fn read_one_calls(&self) -> u64 {
        self.read_one_calls.load(Ordering::SeqCst)
    }

    /// Write a record directly, bypassing the service layer. Lets tests
    /// change the backing data underneath a populated cache.
    pub async fn insert_raw(&self, product: Product) {
        self.next_id.fetch_max(product.id + 1, Ordering::SeqCst);
        self.products.write().await.insert(product.id, product);
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::StoreUnavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create(&self, draft: &ProductDraft) -> Result<i64, CatalogError> {
        self.check_available()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let product = Product {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            quantity: draft.quantity,
        };
        self.products.write().await.insert(id, product);
        Ok(id)
    }

    async fn read_one(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.check_available()?;
        self.read_one_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn read_all(&self) -> Result<Vec<Product>, CatalogError> {
        self.check_available()?;
        self.read_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn update(&self, product: &Product) -> Result<bool, CatalogError> {
        self.check_available()?;
        let mut map = self.products.write().await;
        if !map.contains_key(&product.id) {
            return Ok(false);
        }
        map.insert(product.id, product.clone());
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.check_available()?;
        Ok(self.products.write().await.remove(&id))
    }

    async fn append_history(&self, entry: &PriceHistoryEntry) -> Result<(), CatalogError> {
        self.check_available()?;
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn read_history(&self, id: i64) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        self.check_available()?;
        Ok(self
            .history
            .read()
            .await
            .iter()
            .filter(|entry| entry.product_id == id)
            .cloned()
            .collect())
    }

    async fn read_all_history(&self) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        self.check_available()?;
        Ok(self.history.read().await.clone())
    }
}
