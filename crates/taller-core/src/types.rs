//! # Domain Types
//!
//! Core domain types used by the purchase editor.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │ ProductSummary  │   │   ProductRef    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  id             │   │  Unset          │       │
//! │  │  name           │   │  default price  │   │  Catalog(id)    │       │
//! │  │  price_cents    │   │  tax rate       │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │    Quantity     │   │   LineItemId    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  milli (i64)    │   │  UUID v4        │       │
//! │  │  2100 = 21%     │   │  1500 = 1.5     │   │  never reused   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2100 bps = 21% (general IVA rate), 1050 bps = 10.5%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Quantity
// =============================================================================

/// A purchased quantity in thousandths of a unit.
///
/// Parts are bought in whole units; labour hours, oil by the litre and
/// similar catalog entries allow fractions. Whether a fraction is acceptable
/// is decided by the product (`fractional_units`), not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    /// Milli-units per whole unit.
    pub const SCALE: i64 = 1_000;

    /// Creates a quantity of whole units.
    #[inline]
    pub const fn units(units: i64) -> Self {
        Quantity(units * Self::SCALE)
    }

    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Returns the quantity in thousandths of a unit.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    /// Whether the quantity is a whole number of units.
    #[inline]
    pub const fn is_whole(&self) -> bool {
        self.0 % Self::SCALE == 0
    }

    /// Checks if the quantity is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Rounds up to the next whole unit (positive quantities only).
    pub const fn ceil_to_whole(&self) -> Self {
        if self.is_whole() || self.0 < 0 {
            *self
        } else {
            Quantity((self.0 / Self::SCALE + 1) * Self::SCALE)
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::units(1)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let whole = (self.0 / Self::SCALE).abs();
        let frac = (self.0 % Self::SCALE).abs();
        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:03}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of a line item, unique for the lifetime of an editing session.
///
/// Generated from UUID v4 so a removed row's id can never come back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemId(String);

impl LineItemId {
    /// Generates a fresh identifier.
    pub fn generate() -> Self {
        LineItemId(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductId(String);

impl ProductId {
    /// Wraps an existing catalog identifier.
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    /// Generates a fresh identifier for a new catalog entry.
    pub fn generate() -> Self {
        ProductId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference from a line item into the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "kind", content = "productId")]
pub enum ProductRef {
    /// No product chosen yet.
    #[default]
    Unset,
    /// A product known to the catalog.
    Catalog(ProductId),
}

impl ProductRef {
    /// Returns the product id if one is set.
    pub fn product_id(&self) -> Option<&ProductId> {
        match self {
            ProductRef::Unset => None,
            ProductRef::Catalog(id) => Some(id),
        }
    }

    #[inline]
    pub fn is_unset(&self) -> bool {
        matches!(self, ProductRef::Unset)
    }
}

// =============================================================================
// Line Item Fields
// =============================================================================

/// The operator-editable fields of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum ItemField {
    Product,
    Quantity,
    UnitPrice,
    TaxRate,
}

impl ItemField {
    /// Name used in validation messages.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemField::Product => "product",
            ItemField::Quantity => "quantity",
            ItemField::UnitPrice => "unit price",
            ItemField::TaxRate => "tax rate",
        }
    }
}

impl fmt::Display for ItemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product stored in the workshop catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the purchase form.
    pub name: String,

    /// Default purchase price in cents.
    pub price_cents: i64,

    /// Default tax rate in basis points (2100 = 21%).
    pub tax_rate_bps: u32,

    /// Whether the product is bought in fractions (litres, hours).
    pub fractional_units: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the default price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Projects the product into what the purchase editor needs.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(self.id.clone()),
            name: self.name.clone(),
            default_unit_price: self.price(),
            tax_rate: self.tax_rate(),
            fractional_units: self.fractional_units,
        }
    }
}

/// The catalog's answer to a lookup or a quick-add.
///
/// Price and tax rate are defaults: the line item snapshots them at
/// selection time and never follows later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub default_unit_price: Money,
    pub tax_rate: TaxRate,
    pub fractional_units: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================
