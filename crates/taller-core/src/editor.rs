//! # Purchase Items Editor
//!
//! Owns the ordered line items of one purchase-in-progress and is the only
//! writer of their derived amounts.
//!
//! ## Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Editor Operations                                    │
//! │                                                                         │
//! │  Form Action            Editor Call               State Change          │
//! │  ───────────            ───────────               ────────────          │
//! │                                                                         │
//! │  Open form ───────────► new() ──────────────────► [blank row]          │
//! │  Click "add line" ────► add_item() ─────────────► items.push(blank)    │
//! │  Edit a cell ─────────► handle_item_change() ───► validate, recompute  │
//! │  Pick a product ──────► select_product() ───────► snapshot price/tax   │
//! │  Click remove ────────► remove_item() ──────────► items.remove(i)      │
//! │                         (never the last row)                            │
//! │  Quick-add ───────────► request_quick_add() ────► pending[id] = ticket │
//! │      ... catalog round-trip, editing continues ...                      │
//! │  Catalog answers ─────► resolve_quick_add() ────► patch row by id      │
//! │                                                                         │
//! │  Every mutation ends with recompute_totals().                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick-Add Races
//! A resolution is applied against the collection as it is when the answer
//! arrives, located by line id and request id, never by index:
//! - row removed meanwhile → `QuickAddOutcome::Stale`, dropped silently
//! - second quick-add from the same row → the first one is `Stale`
//! - operator picked another product meanwhile → `Stale`
//! - operator edited price or tax meanwhile → those fields are kept
//! - operator typed a fractional quantity meanwhile and the new product is
//!   sold in whole units → `QuickAddOutcome::Rejected`, row untouched

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::catalog::{CatalogError, CatalogResult};
use crate::error::{EditorError, EditorResult, ValidationError};
use crate::line_item::LineItem;
use crate::money::Money;
use crate::notice::EditorNotice;
use crate::row::{LineItemRow, RowIntent};
use crate::submission::{PurchaseLine, PurchaseSubmission, PurchaseTotals};
use crate::types::{ItemField, LineItemId, ProductId, ProductSummary, Quantity, TaxRate};
use crate::validation::{
    parse_price, parse_quantity, parse_tax_rate, validate_price, validate_product_name,
    validate_quantity, validate_tax_rate, ValidationResult,
};

// =============================================================================
// Edits
// =============================================================================

/// A typed field edit.
///
/// Products are attached through [`PurchaseItemsEditor::select_product`]
/// with catalog data; a raw edit can only clear one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEdit {
    ClearProduct,
    Quantity(Quantity),
    UnitPrice(Money),
    TaxRate(TaxRate),
}

impl ItemEdit {
    /// Parses raw operator input for `field`.
    ///
    /// An empty product cell clears the product. Any other product text is
    /// rejected: an id typed by hand carries no name, price or tax rate.
    pub fn parse(field: ItemField, raw: &str) -> ValidationResult<Self> {
        Ok(match field {
            ItemField::Product => {
                if !raw.trim().is_empty() {
                    return Err(ValidationError::InvalidFormat {
                        field: "product".to_string(),
                        reason: "select it from the catalog".to_string(),
                    });
                }
                ItemEdit::ClearProduct
            }
            ItemField::Quantity => ItemEdit::Quantity(parse_quantity(raw)?),
            ItemField::UnitPrice => ItemEdit::UnitPrice(parse_price(raw)?),
            ItemField::TaxRate => ItemEdit::TaxRate(parse_tax_rate(raw)?),
        })
    }

    /// The field this edit targets.
    pub fn field(&self) -> ItemField {
        match self {
            ItemEdit::ClearProduct => ItemField::Product,
            ItemEdit::Quantity(_) => ItemField::Quantity,
            ItemEdit::UnitPrice(_) => ItemField::UnitPrice,
            ItemEdit::TaxRate(_) => ItemField::TaxRate,
        }
    }
}

// =============================================================================
// Quick-Add Bookkeeping
// =============================================================================

/// Identifier of one quick-add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuickAddId(Uuid);

impl QuickAddId {
    fn generate() -> Self {
        QuickAddId(Uuid::new_v4())
    }
}

/// Handle for an outstanding quick-add; passed back to `resolve_quick_add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddTicket {
    pub request_id: QuickAddId,
    pub item_id: LineItemId,
    pub draft_name: String,
}

/// Fields the operator touched since the quick-add was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DirtyFields {
    product: bool,
    quantity: bool,
    unit_price: bool,
    tax_rate: bool,
}

impl DirtyFields {
    fn mark(&mut self, field: ItemField) {
        match field {
            ItemField::Product => self.product = true,
            ItemField::UnitPrice => self.unit_price = true,
            ItemField::TaxRate => self.tax_rate = true,
            ItemField::Quantity => self.quantity = true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingQuickAdd {
    request_id: QuickAddId,
    dirty: DirtyFields,
}

/// What happened to a quick-add resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuickAddOutcome {
    /// The new product was attached to its row.
    Applied {
        item_id: LineItemId,
        product_id: ProductId,
    },
    /// The row is gone, the request was superseded, or the operator chose a
    /// different product meanwhile. Nothing changed.
    Stale,
    /// The catalog failed; the row keeps its product unset.
    Failed {
        item_id: LineItemId,
        draft_name: String,
        error: CatalogError,
    },
    /// The product exists but cannot go on the row as the operator left it
    /// (e.g. a fractional quantity typed meanwhile for a whole-unit product).
    /// The row is unchanged.
    Rejected {
        item_id: LineItemId,
        product_id: ProductId,
        field: ItemField,
        error: ValidationError,
    },
}

impl QuickAddOutcome {
    /// The notice to show the operator. Stale resolutions stay silent.
    pub fn notice(&self) -> Option<EditorNotice> {
        match self {
            QuickAddOutcome::Applied {
                item_id,
                product_id,
            } => Some(EditorNotice::QuickAddApplied {
                item_id: item_id.clone(),
                product_id: product_id.clone(),
            }),
            QuickAddOutcome::Stale => None,
            QuickAddOutcome::Failed {
                item_id,
                draft_name,
                error,
            } => Some(EditorNotice::CatalogCreationFailed {
                item_id: item_id.clone(),
                draft_name: draft_name.clone(),
                message: error.to_string(),
            }),
            QuickAddOutcome::Rejected {
                item_id,
                field,
                error,
                ..
            } => Some(EditorNotice::ValidationRejected {
                item_id: item_id.clone(),
                field: *field,
                message: error.to_string(),
            }),
        }
    }
}

/// Result of dispatching a [`RowIntent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Edited,
    Removed(LineItem),
    QuickAddRequested(QuickAddTicket),
}

// =============================================================================
// Editor
// =============================================================================

/// The line-item collection of one purchase.
///
/// ## Invariants
/// - At least one line item exists at all times
/// - Line ids are unique and never reused
/// - `iva_amount` / `line_total` always match their inputs
/// - `totals()` always equals the sum over `items()`
/// - A rejected operation leaves the editor unchanged
#[derive(Debug, Clone)]
pub struct PurchaseItemsEditor {
    items: Vec<LineItem>,
    pending: HashMap<LineItemId, PendingQuickAdd>,
    totals: PurchaseTotals,
}

impl PurchaseItemsEditor {
    /// Creates an editor seeded with one blank line.
    pub fn new() -> Self {
        let mut editor = PurchaseItemsEditor {
            items: vec![LineItem::blank()],
            pending: HashMap::new(),
            totals: PurchaseTotals::default(),
        };
        editor.recompute_totals();
        editor
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Line items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a row may be removed (more than one row exists).
    pub fn can_remove(&self) -> bool {
        self.items.len() > 1
    }

    pub fn totals(&self) -> PurchaseTotals {
        self.totals
    }

    pub fn is_quick_add_pending(&self, id: &LineItemId) -> bool {
        self.pending.contains_key(id)
    }

    /// One row view per line, in order.
    pub fn rows(&self) -> impl Iterator<Item = LineItemRow<'_>> + '_ {
        let can_remove = self.can_remove();
        self.items.iter().map(move |item| {
            LineItemRow::new(item, can_remove, self.pending.contains_key(item.id()))
        })
    }

    fn position(&self, id: &LineItemId) -> EditorResult<usize> {
        self.items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| EditorError::ItemNotFound(id.clone()))
    }

    // -------------------------------------------------------------------------
    // Collection operations
    // -------------------------------------------------------------------------

    /// Appends a blank line and returns its id.
    pub fn add_item(&mut self) -> LineItemId {
        let item = LineItem::blank();
        let id = item.id().clone();
        self.items.push(item);
        self.recompute_totals();
        id
    }

    /// Removes a line.
    ///
    /// ## Errors
    /// - `ItemNotFound` if no such line exists
    /// - `RemovalDenied` if it is the last line
    ///
    /// In both cases the collection is unchanged. A pending quick-add for
    /// the removed line is forgotten, so its resolution becomes stale.
    pub fn remove_item(&mut self, id: &LineItemId) -> EditorResult<LineItem> {
        let index = self.position(id)?;
        if !self.can_remove() {
            return Err(EditorError::RemovalDenied(id.clone()));
        }

        let removed = self.items.remove(index);
        self.pending.remove(id);
        self.recompute_totals();
        Ok(removed)
    }

    /// Applies raw operator input to one field of a line.
    ///
    /// ## Example
    /// ```rust
    /// use taller_core::{ItemField, PurchaseItemsEditor};
    ///
    /// let mut editor = PurchaseItemsEditor::new();
    /// let id = editor.items()[0].id().clone();
    ///
    /// editor.handle_item_change(&id, ItemField::Quantity, "2").unwrap();
    /// editor.handle_item_change(&id, ItemField::UnitPrice, "100").unwrap();
    /// editor.handle_item_change(&id, ItemField::TaxRate, "10").unwrap();
    ///
    /// assert_eq!(editor.totals().iva_total.cents(), 2_000);
    /// assert_eq!(editor.totals().total.cents(), 22_000);
    ///
    /// // Rejected: prior value kept
    /// assert!(editor.handle_item_change(&id, ItemField::Quantity, "0").is_err());
    /// assert_eq!(editor.totals().total.cents(), 22_000);
    /// ```
    pub fn handle_item_change(
        &mut self,
        id: &LineItemId,
        field: ItemField,
        raw: &str,
    ) -> EditorResult<()> {
        self.position(id)?;
        let edit = ItemEdit::parse(field, raw).map_err(|source| EditorError::ValidationRejected {
            item_id: id.clone(),
            field,
            source,
        })?;
        self.apply_edit(id, edit)
    }

    /// Applies a typed edit, validating it first.
    ///
    /// This and the catalog paths below are the only writers of derived
    /// amounts.
    pub fn apply_edit(&mut self, id: &LineItemId, edit: ItemEdit) -> EditorResult<()> {
        let index = self.position(id)?;
        let field = edit.field();
        let reject = |source: ValidationError| EditorError::ValidationRejected {
            item_id: id.clone(),
            field,
            source,
        };

        let mut candidate = self.items[index].clone();
        match edit {
            ItemEdit::ClearProduct => candidate.clear_product(),
            ItemEdit::Quantity(quantity) => {
                validate_quantity(quantity, candidate.fractional_units()).map_err(reject)?;
                candidate.set_quantity(quantity);
            }
            ItemEdit::UnitPrice(price) => {
                validate_price(price).map_err(reject)?;
                candidate.set_unit_price(price);
            }
            ItemEdit::TaxRate(rate) => {
                validate_tax_rate(rate).map_err(reject)?;
                candidate.set_tax_rate(rate);
            }
        }
        self.commit(index, candidate).map_err(reject)?;

        if let Some(pending) = self.pending.get_mut(id) {
            pending.dirty.mark(field);
        }
        Ok(())
    }

    /// Attaches an existing catalog product to a line, snapshotting its
    /// default price and tax rate.
    pub fn select_product(&mut self, id: &LineItemId, product: &ProductSummary) -> EditorResult<()> {
        let index = self.position(id)?;
        validate_catalog_defaults(product).map_err(|(field, source)| {
            EditorError::ValidationRejected {
                item_id: id.clone(),
                field,
                source,
            }
        })?;

        let mut candidate = self.items[index].clone();
        candidate.attach_product(product);
        candidate.set_unit_price(product.default_unit_price);
        candidate.set_tax_rate(product.tax_rate);
        self.commit(index, candidate)
            .map_err(|source| EditorError::ValidationRejected {
                item_id: id.clone(),
                field: ItemField::Product,
                source,
            })?;

        if let Some(pending) = self.pending.get_mut(id) {
            pending.dirty.mark(ItemField::Product);
            pending.dirty.mark(ItemField::UnitPrice);
            pending.dirty.mark(ItemField::TaxRate);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Quick-add
    // -------------------------------------------------------------------------

    /// Registers a quick-add request for a line.
    ///
    /// The caller sends `ticket.draft_name` to the catalog and hands the
    /// answer to [`resolve_quick_add`](Self::resolve_quick_add). A newer
    /// request from the same line supersedes an older one.
    pub fn request_quick_add(
        &mut self,
        id: &LineItemId,
        draft_name: &str,
    ) -> EditorResult<QuickAddTicket> {
        self.position(id)?;
        validate_product_name(draft_name).map_err(|source| EditorError::ValidationRejected {
            item_id: id.clone(),
            field: ItemField::Product,
            source,
        })?;

        let ticket = QuickAddTicket {
            request_id: QuickAddId::generate(),
            item_id: id.clone(),
            draft_name: draft_name.trim().to_string(),
        };
        self.pending.insert(
            id.clone(),
            PendingQuickAdd {
                request_id: ticket.request_id,
                dirty: DirtyFields::default(),
            },
        );
        Ok(ticket)
    }

    /// Applies the catalog's answer to a quick-add against current state.
    pub fn resolve_quick_add(
        &mut self,
        ticket: &QuickAddTicket,
        result: CatalogResult<ProductSummary>,
    ) -> QuickAddOutcome {
        let pending = match self.pending.get(&ticket.item_id) {
            Some(pending) if pending.request_id == ticket.request_id => *pending,
            _ => return QuickAddOutcome::Stale,
        };
        self.pending.remove(&ticket.item_id);

        let Some(index) = self.items.iter().position(|item| item.id() == &ticket.item_id) else {
            return QuickAddOutcome::Stale;
        };

        if pending.dirty.product {
            return QuickAddOutcome::Stale;
        }

        let product = match result {
            Ok(product) => product,
            Err(error) => {
                return QuickAddOutcome::Failed {
                    item_id: ticket.item_id.clone(),
                    draft_name: ticket.draft_name.clone(),
                    error,
                }
            }
        };

        if let Err((_, source)) = validate_catalog_defaults(&product) {
            return QuickAddOutcome::Failed {
                item_id: ticket.item_id.clone(),
                draft_name: ticket.draft_name.clone(),
                error: CatalogError::CreationFailed(source.to_string()),
            };
        }

        let rejected = |field: ItemField, error: ValidationError| QuickAddOutcome::Rejected {
            item_id: ticket.item_id.clone(),
            product_id: product.id.clone(),
            field,
            error,
        };

        let mut candidate = self.items[index].clone();
        if pending.dirty.quantity {
            if let Err(error) = validate_quantity(candidate.quantity(), product.fractional_units) {
                return rejected(ItemField::Quantity, error);
            }
        }
        candidate.attach_product(&product);
        if !pending.dirty.unit_price {
            candidate.set_unit_price(product.default_unit_price);
        }
        if !pending.dirty.tax_rate {
            candidate.set_tax_rate(product.tax_rate);
        }
        if let Err(error) = self.commit(index, candidate) {
            return rejected(ItemField::Product, error);
        }

        QuickAddOutcome::Applied {
            item_id: ticket.item_id.clone(),
            product_id: product.id,
        }
    }

    // -------------------------------------------------------------------------
    // Row messages
    // -------------------------------------------------------------------------

    /// Applies an intent produced by a [`LineItemRow`].
    pub fn dispatch(&mut self, intent: RowIntent) -> EditorResult<DispatchOutcome> {
        match intent {
            RowIntent::Edit {
                item_id,
                field,
                raw,
            } => {
                self.handle_item_change(&item_id, field, &raw)?;
                Ok(DispatchOutcome::Edited)
            }
            RowIntent::Remove { item_id } => {
                self.remove_item(&item_id).map(DispatchOutcome::Removed)
            }
            RowIntent::QuickAdd {
                item_id,
                draft_name,
            } => self
                .request_quick_add(&item_id, &draft_name)
                .map(DispatchOutcome::QuickAddRequested),
        }
    }

    // -------------------------------------------------------------------------
    // Totals and submission
    // -------------------------------------------------------------------------

    /// Swaps an edited line in, keeping the previous one when its amounts
    /// or the purchase totals would not fit in `Money`.
    fn commit(&mut self, index: usize, mut candidate: LineItem) -> ValidationResult<()> {
        candidate.recompute()?;
        let previous = std::mem::replace(&mut self.items[index], candidate);

        match PurchaseTotals::checked_from_items(&self.items) {
            Some(totals) => {
                self.totals = totals;
                Ok(())
            }
            None => {
                self.items[index] = previous;
                Err(ValidationError::TooLarge {
                    field: "purchase total".to_string(),
                })
            }
        }
    }

    /// Recomputes the aggregate totals. Idempotent.
    pub fn recompute_totals(&mut self) -> PurchaseTotals {
        self.totals = PurchaseTotals::from_items(&self.items);
        self.totals
    }

    /// Builds the normalized payload for the caller to persist.
    ///
    /// ## Errors
    /// - `QuickAddPending` while any line waits for the catalog
    /// - `IncompleteItem` for the first line without a product
    pub fn submission(&self) -> EditorResult<PurchaseSubmission> {
        let mut lines = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if self.pending.contains_key(item.id()) {
                return Err(EditorError::QuickAddPending(item.id().clone()));
            }
            let product_id = item
                .product_ref()
                .product_id()
                .ok_or_else(|| EditorError::IncompleteItem(item.id().clone()))?;

            lines.push(PurchaseLine {
                product_id: product_id.clone(),
                product_name: item.product_name().map(str::to_string),
                quantity: item.quantity(),
                unit_price: item.unit_price(),
                tax_rate: item.tax_rate(),
                iva_amount: item.iva_amount(),
                line_total: item.line_total(),
            });
        }

        Ok(PurchaseSubmission {
            lines,
            totals: self.totals,
            prepared_at: Utc::now(),
        })
    }
}

impl Default for PurchaseItemsEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Catalog data is validated like operator input before it lands on a row.
fn validate_catalog_defaults(product: &ProductSummary) -> Result<(), (ItemField, ValidationError)> {
    validate_price(product.default_unit_price).map_err(|e| (ItemField::UnitPrice, e))?;
    validate_tax_rate(product.tax_rate).map_err(|e| (ItemField::TaxRate, e))?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
