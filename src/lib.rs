//! # vitrine
//!
//! Read cache and price-history ledger for a product catalog service.
//!
//! The crate sits between a request-handling layer (HTTP routing, auth, DTO
//! shaping — all external) and a durable catalog store, and owns three
//! things:
//!
//! - **Cache-aside reads**: bulk and per-product views are served from an
//!   in-memory TTL cache, falling back to the store on a miss and
//!   repopulating on the way back.
//! - **Write invalidation**: every mutation goes to the store first; only
//!   after the commit is confirmed are the affected cache entries removed,
//!   so a re-read after invalidation never observes pre-write state.
//! - **The price ledger**: an append-only history row per price-affecting
//!   write, kept alongside the product records and left untouched by
//!   deletes.
//!
//! A [`cache::Prewarmer`] populates the configured views once at startup and
//! optionally re-warms them on a fixed cadence, stopping on a shared
//! watch-channel shutdown signal.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::watch;
//! use vitrine::{CachePolicy, CatalogService, MemoryStore, Prewarmer};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let policy = CachePolicy::from_env()?;
//! let store = Arc::new(MemoryStore::new());
//! let service = Arc::new(CatalogService::new(store, policy.clone()));
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let prewarmer = Prewarmer::new(service.clone(), policy, shutdown_rx);
//! prewarmer.warm_all().await;
//! let refresh_tasks = prewarmer.spawn_refresh_loops();
//!
//! // ... hand `service` to the request-handling layer ...
//!
//! shutdown_tx.send(true)?;
//! for task in refresh_tasks {
//!     task.await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use cache::{CacheKey, Prewarmer, ViewKind};
pub use config::{CachePolicy, ViewPolicy};
pub use error::CatalogError;
pub use model::{PriceHistoryEntry, Product, ProductDraft, ProductPatch};
pub use service::CatalogService;
pub use store::{CatalogStore, MemoryStore};
