//! # taller-core: Pure Purchase Logic for Taller
//!
//! This crate holds the purchase line-item editor of the workshop
//! back-office as pure, synchronous code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taller Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Purchase form (browser)                         │   │
//! │  │    rows ──► RowIntent ──►            ◄── EditorNotice           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           taller-purchase (PurchaseSession, async)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ taller-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │ line_item │  │  editor   │  │ validation│  │   │
//! │  │   │   Money   │  │ LineItem  │  │ Purchase- │  │   parse   │  │   │
//! │  │   │  TaxRate  │  │  IVA math │  │ Items-    │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  │ Editor    │  └───────────┘  │   │
//! │  │                                 └───────────┘                  │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ ProductCatalog trait                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              taller-db (SQLite product catalog)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (TaxRate, Quantity, ids, Product)
//! - [`money`] - Money type with integer arithmetic
//! - [`line_item`] - One purchase line and its derived amounts
//! - [`editor`] - The line-item collection and quick-add reconciliation
//! - [`row`] - Per-row views and intents
//! - [`submission`] - Totals and the submission payload
//! - [`catalog`] - Product catalog port
//! - [`notice`] - Structured operator notices
//! - [`error`] - Domain error types
//! - [`validation`] - Input parsing and rules
//!
//! ## Example Usage
//!
//! ```rust
//! use taller_core::{ItemField, Money, PurchaseItemsEditor};
//!
//! let mut editor = PurchaseItemsEditor::new();
//! let id = editor.items()[0].id().clone();
//! editor.handle_item_change(&id, ItemField::UnitPrice, "100").unwrap();
//! editor.handle_item_change(&id, ItemField::TaxRate, "21").unwrap();
//!
//! assert_eq!(editor.totals().total, Money::from_cents(12_100));
//!
//! // The last line can never be removed
//! assert!(editor.remove_item(&id).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod editor;
pub mod error;
pub mod line_item;
pub mod money;
pub mod notice;
pub mod row;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{CatalogError, CatalogResult, ProductCatalog};
pub use editor::{
    DispatchOutcome, ItemEdit, PurchaseItemsEditor, QuickAddId, QuickAddOutcome, QuickAddTicket,
};
pub use error::{EditorError, EditorResult, ValidationError};
pub use line_item::LineItem;
pub use money::Money;
pub use notice::EditorNotice;
pub use row::{LineItemRow, RowIntent};
pub use submission::{PurchaseLine, PurchaseSubmission, PurchaseTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line, in whole units.
///
/// Catches slips such as typing 10000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 99_999;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;
