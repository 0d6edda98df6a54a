//! Caching infrastructure for the catalog.
//!
//! This module provides:
//! - Tagged cache keys, one namespace per view family
//! - An expiring in-memory entry store with explicit invalidation
//! - The startup pre-warm pass and periodic view refresh loops

pub mod key;
pub mod prewarm;
pub mod store;

pub use key::{CacheKey, ViewKind};
pub use prewarm::Prewarmer;
pub use store::CacheStore;
