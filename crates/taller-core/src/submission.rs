//! # Purchase Totals and Submission Payload
//!
//! What the editor hands to the purchase form when it is submitted.
//! Nothing here is persisted by the core.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ts_rs::TS;

use crate::line_item::LineItem;
use crate::money::Money;
use crate::types::{ProductId, Quantity, TaxRate};

/// Aggregate amounts across every line of the purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTotals {
    pub item_count: usize,
    /// Sum of net amounts (before IVA).
    pub subtotal: Money,
    /// Sum of `iva_amount`.
    pub iva_total: Money,
    /// Sum of `line_total`.
    pub total: Money,
}

impl PurchaseTotals {
    /// Sums the given lines. O(n), recomputed on every change.
    pub fn from_items(items: &[LineItem]) -> Self {
        PurchaseTotals {
            item_count: items.len(),
            subtotal: items.iter().map(LineItem::net_amount).sum(),
            iva_total: items.iter().map(LineItem::iva_amount).sum(),
            total: items.iter().map(LineItem::line_total).sum(),
        }
    }

    /// Like [`from_items`](Self::from_items), but `None` if any sum
    /// overflows.
    pub fn checked_from_items(items: &[LineItem]) -> Option<Self> {
        let sum = |amount: fn(&LineItem) -> Money| {
            items
                .iter()
                .try_fold(Money::zero(), |acc, item| acc.checked_add(amount(item)))
        };

        Some(PurchaseTotals {
            item_count: items.len(),
            subtotal: sum(LineItem::net_amount)?,
            iva_total: sum(LineItem::iva_amount)?,
            total: sum(LineItem::line_total)?,
        })
    }
}

/// One normalized purchase line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub product_name: Option<String>,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub tax_rate: TaxRate,
    pub iva_amount: Money,
    pub line_total: Money,
}

/// The ordered lines plus totals, ready for the caller to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSubmission {
    pub lines: Vec<PurchaseLine>,
    pub totals: PurchaseTotals,
    #[ts(as = "String")]
    pub prepared_at: DateTime<Utc>,
}
