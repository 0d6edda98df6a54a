//! Startup pre-warm pass and periodic view refresh.
//!
//! The warm pass runs once before the process starts taking traffic so that
//! the configured views begin life as cache hits. Views with a nonzero
//! refresh interval then get one background task each, re-running the warm
//! for the rest of the process lifetime until the shared shutdown signal
//! flips. A failed pass is logged and skipped; the read-through path fills
//! the view lazily, and a previously warmed entry is left in place rather
//! than evicted on a failed refresh.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::{CachePolicy, ViewPolicy};
use crate::service::CatalogService;

/// How many views a warm pass loads concurrently.
const WARM_CONCURRENCY: usize = 4;

pub struct Prewarmer {
    service: Arc<CatalogService>,
    policy: CachePolicy,
    shutdown_rx: watch::Receiver<bool>,
}

impl Prewarmer {
    pub fn new(
        service: Arc<CatalogService>,
        policy: CachePolicy,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            service,
            policy,
            shutdown_rx,
        }
    }

    /// Run the startup warm pass over every configured view.
    ///
    /// Never fatal: a view whose load fails is skipped and will be
    /// populated lazily on its first read.
    pub async fn warm_all(&self) {
        info!(views = self.policy.views.len(), "pre-warming cache");
        stream::iter(self.policy.views.iter())
            .for_each_concurrent(WARM_CONCURRENCY, |view| {
                let service = self.service.clone();
                async move {
                    if let Err(e) = service.warm_view(view).await {
                        warn!(view = %view.view, error = %e, "pre-warm failed, view will fill lazily");
                    }
                }
            })
            .await;
    }

    /// Spawn one refresh task per view with a nonzero refresh interval.
    pub fn spawn_refresh_loops(&self) -> Vec<JoinHandle<()>> {
        self.policy
            .views
            .iter()
            .filter_map(|view| {
                let period = view.refresh_interval()?;
                info!(view = %view.view, period_secs = period.as_secs(), "starting refresh loop");
                Some(tokio::spawn(refresh_loop(
                    self.service.clone(),
                    view.clone(),
                    period,
                    self.shutdown_rx.clone(),
                )))
            })
            .collect()
    }
}

async fn refresh_loop(
    service: Arc<CatalogService>,
    view: ViewPolicy,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // First tick only after a full period: warm_all already covered startup.
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    // The refresh runs inline with the ticker, so a pass still in flight
    // when the next tick comes due makes that tick get skipped outright.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!(view = %view.view, "refresh loop stopping");
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(e) = service.warm_view(&view).await {
                    warn!(view = %view.view, error = %e, "refresh pass failed, keeping previous entry");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::ViewKind;
    use crate::model::Product;
    use crate::store::MemoryStore;

    fn product(id: i64, price: f64) -> Product {
        Product {
            id,
            name: format!("product-{id}"),
            description: "test product".to_string(),
            price,
            quantity: 10,
        }
    }

    fn policy(spec: &[(ViewKind, u64, u64)]) -> CachePolicy {
        CachePolicy {
            views: spec
                .iter()
                .map(|&(view, ttl_secs, refresh_secs)| ViewPolicy {
                    view,
                    ttl_secs,
                    refresh_secs,
                })
                .collect(),
            capacity: None,
        }
    }

    async fn setup(policy: CachePolicy) -> (Arc<MemoryStore>, Arc<CatalogService>, Prewarmer, watch::Sender<bool>) {
        let store = Arc::new(
            MemoryStore::with_products(vec![product(1, 8.29), product(2, 5.78)]).await,
        );
        let service = Arc::new(CatalogService::new(store.clone(), policy.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let prewarmer = Prewarmer::new(service.clone(), policy, shutdown_rx);
        (store, service, prewarmer, shutdown_tx)
    }

    #[tokio::test]
    async fn warm_all_covers_every_configured_view() {
        let policy = policy(&[
            (ViewKind::AllProducts, 60, 0),
            (ViewKind::Products, 60, 0),
        ]);
        let (store, service, prewarmer, _shutdown_tx) = setup(policy).await;

        prewarmer.warm_all().await;
        assert_eq!(store.read_all_calls(), 2);

        // Bulk and per-item reads are all hits now.
        assert_eq!(service.get_all_products().await.unwrap().len(), 2);
        assert_eq!(service.get_product(1).await.unwrap().price, 8.29);
        assert_eq!(store.read_all_calls(), 2);
        assert_eq!(store.read_one_calls(), 0);
    }

    #[tokio::test]
    async fn failed_warm_is_skipped_not_fatal() {
        let policy = policy(&[(ViewKind::AllProducts, 60, 0)]);
        let (store, service, prewarmer, _shutdown_tx) = setup(policy).await;

        store.set_unavailable(true);
        prewarmer.warm_all().await;

        // Once the store is back, the read-through path fills the view.
        store.set_unavailable(false);
        assert_eq!(service.get_all_products().await.unwrap().len(), 2);
        assert_eq!(store.read_all_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_loop_rewarms_on_its_interval() {
        let policy = policy(&[(ViewKind::AllProducts, 600, 30)]);
        let (store, service, prewarmer, shutdown_tx) = setup(policy).await;

        prewarmer.warm_all().await;
        assert_eq!(store.read_all_calls(), 1);
        let handles = prewarmer.spawn_refresh_loops();
        assert_eq!(handles.len(), 1);

        // Change the backing data underneath the cache (no invalidation).
        store.insert_raw(product(3, 1.23)).await;
        assert_eq!(service.get_all_products().await.unwrap().len(), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        // The refresh pass refetched and replaced the bulk entry.
        assert_eq!(store.read_all_calls(), 2);
        assert_eq!(service.get_all_products().await.unwrap().len(), 3);
        assert_eq!(store.read_all_calls(), 2);

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_entry_and_later_cycles() {
        let policy = policy(&[(ViewKind::AllProducts, 600, 30)]);
        let (store, service, prewarmer, shutdown_tx) = setup(policy).await;

        prewarmer.warm_all().await;
        let handles = prewarmer.spawn_refresh_loops();

        store.set_unavailable(true);
        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;

        // The failed cycle left the warm entry in place.
        assert_eq!(service.get_all_products().await.unwrap().len(), 2);

        // A later cycle succeeds once the store is back.
        store.set_unavailable(false);
        store.insert_raw(product(3, 1.23)).await;
        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        assert_eq!(service.get_all_products().await.unwrap().len(), 3);

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn warm_once_views_spawn_no_loops() {
        let policy = policy(&[(ViewKind::AllProducts, 60, 0)]);
        let (_store, _service, prewarmer, _shutdown_tx) = setup(policy).await;
        assert!(prewarmer.spawn_refresh_loops().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_shutdown_sender_stops_loops() {
        let policy = policy(&[(ViewKind::AllProducts, 600, 30)]);
        let (_store, _service, prewarmer, shutdown_tx) = setup(policy).await;

        let handles = prewarmer.spawn_refresh_loops();
        drop(shutdown_tx);
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
