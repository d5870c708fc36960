//! # Error Types
//!
//! Domain-specific error types for taller-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  taller-core errors (this file)                                        │
//! │  ├── EditorError      - Rejected editor operations                     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  taller-core::catalog                                                  │
//! │  └── CatalogError     - Lookup / quick-add failures                    │
//! │                                                                         │
//! │  taller-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → EditorError → EditorNotice → purchase form    │
//! │        DbError → CatalogError → EditorNotice → purchase form           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recovery
//! Nothing here is fatal to the purchase form. Every rejected operation
//! leaves the editor exactly as it was before the attempt.

use thiserror::Error;

use crate::types::{ItemField, LineItemId};

// =============================================================================
// Editor Error
// =============================================================================

/// Errors returned by `PurchaseItemsEditor` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// No line item with this id exists (never did, or was removed).
    #[error("Line item not found: {0}")]
    ItemNotFound(LineItemId),

    /// Attempt to remove the last remaining line item.
    ///
    /// ## User Workflow
    /// ```text
    /// Purchase with one row
    ///      │
    ///      ▼
    /// remove_item(row)
    ///      │
    ///      ▼
    /// RemovalDenied(row) ── collection unchanged, optional notice
    /// ```
    #[error("Line item {0} is the last one and cannot be removed")]
    RemovalDenied(LineItemId),

    /// A field edit failed validation; the prior value is kept.
    #[error("Invalid {field} on line {item_id}: {source}")]
    ValidationRejected {
        item_id: LineItemId,
        field: ItemField,
        #[source]
        source: ValidationError,
    },

    /// Submission attempted while a line has no product.
    #[error("Line item {0} has no product")]
    IncompleteItem(LineItemId),

    /// Submission attempted while a quick-add for the line is outstanding.
    #[error("Line item {0} is waiting for a quick-added product")]
    QuickAddPending(LineItemId),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// The editor wraps them in `EditorError::ValidationRejected`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (non-numeric, too many decimals).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A computed amount does not fit in the money representation.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// A fractional quantity for a product sold in whole units.
    #[error("{field} must be a whole number for this product")]
    FractionalQuantity { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

// =============================================================================
// Unit Tests
// =============================================================================
