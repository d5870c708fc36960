//! # Product Catalog Port
//!
//! The purchase editor consults the catalog in two ways:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator picks an existing product                                    │
//! │      lookup(product_id) ──► ProductSummary (default price / tax)       │
//! │                                                                         │
//! │  Operator types a name the catalog doesn't know (quick-add)            │
//! │      create(draft_name) ──► ProductSummary for the new entry           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The trait lives in the core so the editor and session can be tested
//! against any implementation; the SQLite one lives in `taller-db`.
//! Implementations own timeout and retry semantics and report every failure
//! as a single `CatalogError`.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{ProductId, ProductSummary};

/// Errors reported by a product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No active product with this id.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The catalog refused or failed to create the product.
    #[error("Product could not be created: {0}")]
    CreationFailed(String),

    /// The request did not complete in time.
    #[error("Catalog request timed out")]
    TimedOut,

    /// The catalog backend is unreachable or failed unexpectedly.
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Read-mostly access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks up an active product by id.
    async fn lookup(&self, id: &ProductId) -> CatalogResult<ProductSummary>;

    /// Creates a product from a draft name typed on the purchase form.
    ///
    /// Must return a stable id plus the default unit price and tax rate.
    /// Implementations may de-duplicate by name.
    async fn create(&self, draft_name: &str) -> CatalogResult<ProductSummary>;
}
