//! Catalog service: cache-aside reads and write invalidation.
//!
//! Reads check the cache first and fall back to the store on a miss,
//! populating the cache on the way back. Writes go to the store first; only
//! after the store (and, for price changes, the ledger) has confirmed the
//! commit are the affected cache entries invalidated. A reader that misses
//! the cache after an invalidation therefore never re-reads a state older
//! than the write that caused it. If the commit fails, the cache is left
//! untouched and any prior entry remains valid.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::key::{CacheKey, ViewKind};
use crate::cache::store::CacheStore;
use crate::config::{CachePolicy, ViewPolicy};
use crate::error::CatalogError;
use crate::model::{PriceHistoryEntry, Product, ProductDraft, ProductPatch};
use crate::store::CatalogStore;

/// One cached catalog view.
#[derive(Clone)]
enum CachedView {
    One(Product),
    Many(Vec<Product>),
}

/// The catalog subsystem exposed to the request-handling layer.
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    cache: CacheStore<CachedView>,
    policy: CachePolicy,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>, policy: CachePolicy) -> Self {
        let cache = CacheStore::new(policy.capacity);
        Self {
            store,
            cache,
            policy,
        }
    }

    // ---- read path ----

    pub async fn get_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::AllProducts;
        if let Some(CachedView::Many(products)) = self.cache.get(&key) {
            debug!(cache_key = %key, "cache HIT");
            return Ok(products);
        }

        debug!(cache_key = %key, "cache MISS, fetching from store");
        let products = self.store.read_all().await?;
        self.cache.put(
            key,
            CachedView::Many(products.clone()),
            self.policy.ttl_for(ViewKind::AllProducts),
        );
        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CachedView::One(product)) = self.cache.get(&key) {
            debug!(cache_key = %key, "cache HIT");
            return Ok(product);
        }

        debug!(cache_key = %key, "cache MISS, fetching from store");
        // An absent product is never cached: a negative entry would mask a
        // subsequent creation until its TTL ran out.
        let product = self
            .store
            .read_one(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;
        self.cache.put(
            key,
            CachedView::One(product.clone()),
            self.policy.ttl_for(ViewKind::Products),
        );
        Ok(product)
    }

    // ---- ledger reads (never cached) ----

    pub async fn get_all_prices(&self) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        self.store.read_all_history().await
    }

    /// History for one identity. A deleted product's rows remain readable;
    /// only an identity with neither a record nor history is not-found.
    pub async fn get_prices(&self, id: i64) -> Result<Vec<PriceHistoryEntry>, CatalogError> {
        let rows = self.store.read_history(id).await?;
        if rows.is_empty() && self.store.read_one(id).await?.is_none() {
            return Err(CatalogError::NotFound(id));
        }
        Ok(rows)
    }

    // ---- write path ----

    pub async fn create_product(&self, draft: &ProductDraft) -> Result<i64, CatalogError> {
        draft.validate()?;
        let id = self.store.create(draft).await?;
        self.store
            .append_history(&PriceHistoryEntry::now(id, draft.price))
            .await?;

        // The new item cannot be synthesized into a stale bulk entry, so the
        // bulk view is dropped and refetched on its next read.
        self.cache.invalidate(&CacheKey::AllProducts);
        info!(product_id = id, "product created");
        Ok(id)
    }

    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
    ) -> Result<Product, CatalogError> {
        patch.validate()?;
        let mut product = self
            .store
            .read_one(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let price_changed = patch.apply(&mut product);
        if !self.store.update(&product).await? {
            return Err(CatalogError::NotFound(id));
        }
        if price_changed {
            self.store
                .append_history(&PriceHistoryEntry::now(id, product.price))
                .await?;
        }

        self.invalidate_product(id);
        info!(product_id = id, price_changed, "product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: i64) -> Result<Product, CatalogError> {
        let product = self
            .store
            .delete(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        // Ledger rows stay: history of a deleted product remains queryable.
        self.invalidate_product(id);
        info!(product_id = id, "product deleted");
        Ok(product)
    }

    /// Quantity-only adjustment. The delta may be negative, but the
    /// resulting quantity must stay non-negative. No ledger row is written:
    /// the ledger tracks price, not stock.
    pub async fn add_stock(&self, id: i64, delta: i64) -> Result<Product, CatalogError> {
        let mut product = self
            .store
            .read_one(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        product.quantity = i64::from(product.quantity)
            .checked_add(delta)
            .and_then(|quantity| u32::try_from(quantity).ok())
            .ok_or_else(|| {
                CatalogError::invalid(format!(
                    "stock adjustment of {delta} is out of range for product {id}"
                ))
            })?;

        if !self.store.update(&product).await? {
            return Err(CatalogError::NotFound(id));
        }

        self.invalidate_product(id);
        info!(product_id = id, delta, "stock adjusted");
        Ok(product)
    }

    // ---- pre-warm support ----

    /// Populate one configured view from the store with its policy TTL.
    pub async fn warm_view(&self, view: &ViewPolicy) -> Result<(), CatalogError> {
        let products = self.store.read_all().await?;
        let count = products.len();
        match view.view {
            ViewKind::AllProducts => {
                self.cache
                    .put(CacheKey::AllProducts, CachedView::Many(products), view.ttl());
            }
            ViewKind::Products => {
                for product in products {
                    self.cache.put(
                        CacheKey::Product(product.id),
                        CachedView::One(product),
                        view.ttl(),
                    );
                }
            }
        }
        info!(view = %view.view, products = count, "view warmed");
        Ok(())
    }

    /// A committed write to `id` takes out both the per-item entry and the
    /// bulk view, whose correctness depends on every constituent item.
    ///
    /// Exact keys suffice here: a single write affects one per-item entry
    /// plus the one bulk entry. [`CacheStore::invalidate_family`] is for
    /// callers that need to drop a whole view family at once, such as a
    /// host-triggered flush of every per-product entry.
    fn invalidate_product(&self, id: i64) {
        self.cache.invalidate(&CacheKey::Product(id));
        self.cache.invalidate(&CacheKey::AllProducts);
    }
}
