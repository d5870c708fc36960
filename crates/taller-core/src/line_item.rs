//! # Line Items
//!
//! One row of a purchase: a product reference, the quantity bought, the
//! unit price and tax rate captured at entry time, plus the two derived
//! amounts.
//!
//! ## Derived Fields
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity ──┐                                                          │
//! │  unit_price ┼──► recompute() ──► iva_amount = round(q × p × rate)      │
//! │  tax_rate ──┘                    line_total = round(q × p) + iva       │
//! │                                                                         │
//! │  recompute() is crate-private: only the editor writes derived fields.  │
//! │  An amount that would not fit in i64 cents is an error, never wrapped. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{LineItemId, ProductRef, ProductSummary, Quantity, TaxRate};
use crate::validation::ValidationResult;
use crate::MAX_ITEM_QUANTITY;

/// A single purchase line.
///
/// Fields are read through accessors; mutation goes through
/// `PurchaseItemsEditor` so the derived amounts can never drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    id: LineItemId,
    product_ref: ProductRef,
    /// Product name snapshot for display.
    product_name: Option<String>,
    quantity: Quantity,
    unit_price: Money,
    tax_rate: TaxRate,
    fractional_units: bool,
    iva_amount: Money,
    line_total: Money,
}

impl LineItem {
    /// A fresh row: no product, quantity 1, price 0, tax 0.
    pub(crate) fn blank() -> Self {
        LineItem {
            id: LineItemId::generate(),
            product_ref: ProductRef::Unset,
            product_name: None,
            quantity: Quantity::units(1),
            unit_price: Money::zero(),
            tax_rate: TaxRate::zero(),
            fractional_units: false,
            iva_amount: Money::zero(),
            line_total: Money::zero(),
        }
    }

    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    pub fn product_ref(&self) -> &ProductRef {
        &self.product_ref
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Whether the chosen product may be bought in fractions.
    pub fn fractional_units(&self) -> bool {
        self.fractional_units
    }

    /// IVA owed on this line.
    pub fn iva_amount(&self) -> Money {
        self.iva_amount
    }

    /// Net amount plus IVA.
    pub fn line_total(&self) -> Money {
        self.line_total
    }

    /// Net amount (quantity × unit price) before tax.
    pub fn net_amount(&self) -> Money {
        self.line_total - self.iva_amount
    }

    // -------------------------------------------------------------------------
    // Editor-only mutation
    // -------------------------------------------------------------------------

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }

    pub(crate) fn set_unit_price(&mut self, price: Money) {
        self.unit_price = price;
    }

    pub(crate) fn set_tax_rate(&mut self, rate: TaxRate) {
        self.tax_rate = rate;
    }

    /// Detaches the product. The row falls back to whole units.
    pub(crate) fn clear_product(&mut self) {
        self.product_ref = ProductRef::Unset;
        self.product_name = None;
        self.fractional_units = false;
        self.quantity = whole_quantity(self.quantity);
    }

    /// Attaches a catalog product. Whole-unit products round a fractional
    /// quantity up so the row stays valid.
    pub(crate) fn attach_product(&mut self, product: &ProductSummary) {
        self.product_ref = ProductRef::Catalog(product.id.clone());
        self.product_name = Some(product.name.clone());
        self.fractional_units = product.fractional_units;
        if !product.fractional_units {
            self.quantity = whole_quantity(self.quantity);
        }
    }

    /// Recomputes `iva_amount` and `line_total` from the current inputs.
    ///
    /// On overflow the derived fields are left untouched.
    pub(crate) fn recompute(&mut self) -> ValidationResult<()> {
        let too_large = || ValidationError::TooLarge {
            field: "line total".to_string(),
        };

        let net = self
            .unit_price
            .checked_multiply_quantity(self.quantity)
            .ok_or_else(too_large)?;
        let iva = self
            .unit_price
            .checked_tax_for_quantity(self.quantity, self.tax_rate)
            .ok_or_else(too_large)?;
        let total = net.checked_add(iva).ok_or_else(too_large)?;

        self.iva_amount = iva;
        self.line_total = total;
        Ok(())
    }
}

/// Rounds up to whole units without leaving the accepted range.
fn whole_quantity(quantity: Quantity) -> Quantity {
    quantity
        .ceil_to_whole()
        .min(Quantity::units(MAX_ITEM_QUANTITY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    #[test]
    fn test_blank_row_defaults() {
        let item = LineItem::blank();
        assert!(item.product_ref().is_unset());
        assert_eq!(item.quantity(), Quantity::units(1));
        assert!(item.unit_price().is_zero());
        assert!(item.tax_rate().is_zero());
        assert!(item.line_total().is_zero());
    }

    #[test]
    fn test_recompute_scenario() {
        let mut item = LineItem::blank();
        item.set_quantity(Quantity::units(2));
        item.set_unit_price(Money::from_cents(10_000));
        item.set_tax_rate(TaxRate::from_percent(10));
        item.recompute().unwrap();

        assert_eq!(item.iva_amount(), Money::from_cents(2_000));
        assert_eq!(item.line_total(), Money::from_cents(22_000));
        assert_eq!(item.net_amount(), Money::from_cents(20_000));
    }

    #[test]
    fn test_attach_whole_unit_product_rounds_quantity_up() {
        let mut item = LineItem::blank();
        item.set_quantity(Quantity::from_milli(1_500));

        item.attach_product(&ProductSummary {
            id: ProductId::new("p-1"),
            name: "Spark plug".to_string(),
            default_unit_price: Money::from_cents(650),
            tax_rate: TaxRate::from_percent(21),
            fractional_units: false,
        });

        assert_eq!(item.quantity(), Quantity::units(2));
        assert_eq!(item.product_name(), Some("Spark plug"));
    }

    #[test]
    fn test_recompute_overflow_keeps_previous_amounts() {
        let mut item = LineItem::blank();
        item.set_quantity(Quantity::units(2));
        item.set_unit_price(Money::from_cents(10_000));
        item.recompute().unwrap();

        item.set_quantity(Quantity::units(MAX_ITEM_QUANTITY));
        item.set_unit_price(Money::from_cents(99_999_999_999_999_900));
        assert_eq!(
            item.recompute(),
            Err(ValidationError::TooLarge {
                field: "line total".to_string()
            })
        );
        assert_eq!(item.line_total(), Money::from_cents(20_000));
    }
}
