use thiserror::Error;

/// Errors surfaced by the catalog subsystem.
///
/// Cache faults are deliberately not represented: the in-memory cache cannot
/// fail under normal operation, and a stale entry left behind by a
/// post-commit invalidation fault self-corrects at TTL expiry.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(i64),

    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CatalogError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CatalogError::InvalidInput(msg.into())
    }
}
