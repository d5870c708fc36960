//! # taller-db: Product Catalog Storage for Taller
//!
//! SQLite storage for the workshop product catalog, exposed to the purchase
//! editor through the `ProductCatalog` trait from taller-core.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taller_core::ProductCatalog;
//! use taller_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()).await?;
//! let catalog = db.products();
//!
//! let created = catalog.create("Brake pads (front)").await?;
//! let found = catalog.lookup(&created.id).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};
pub use repository::product::ProductRepository;
