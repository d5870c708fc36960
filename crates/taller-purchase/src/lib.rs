//! # taller-purchase: Purchase Editing Session
//!
//! Runs a `PurchaseItemsEditor` against a product catalog.
//!
//! ## Module Organization
//!
//! - [`session`] - `PurchaseSession`: locking, quick-add tasks, notices
//! - [`config`] - Environment-driven session settings
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. telemetry::init_tracing()            RUST_LOG or defaults          │
//! │  2. Database::new(DbConfig::from_env())  pool + migrations             │
//! │  3. PurchaseSession::new(catalog, SessionConfig::from_env())           │
//! │  4. Form sends RowIntents, receives EditorNotices and snapshots        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod session;
pub mod telemetry;

pub use config::SessionConfig;
pub use session::{PurchaseSession, SessionError, SessionResult, SessionSnapshot};
