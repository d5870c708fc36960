//! # Line Item Rows
//!
//! The per-row view handed to the purchase form. A row shows one
//! `LineItem` and turns operator gestures into [`RowIntent`] messages;
//! the editor is the only place those messages are applied.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   LineItemRow ──edit()──────► RowIntent::Edit      ─┐                  │
//! │               ──remove()────► RowIntent::Remove     ├─► editor.dispatch │
//! │               ──quick_add()─► RowIntent::QuickAdd  ─┘                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::line_item::LineItem;
use crate::types::{ItemField, LineItemId};

/// Read-only view of one line plus the flags the form needs to render it.
#[derive(Debug, Clone, Copy)]
pub struct LineItemRow<'a> {
    item: &'a LineItem,
    can_remove: bool,
    quick_add_pending: bool,
}

impl<'a> LineItemRow<'a> {
    pub(crate) fn new(item: &'a LineItem, can_remove: bool, quick_add_pending: bool) -> Self {
        LineItemRow {
            item,
            can_remove,
            quick_add_pending,
        }
    }

    /// The line this row displays.
    pub fn item(&self) -> &'a LineItem {
        self.item
    }

    pub fn id(&self) -> &'a LineItemId {
        self.item.id()
    }

    /// False when this is the only row left.
    pub fn can_remove(&self) -> bool {
        self.can_remove
    }

    /// True while a quick-add issued from this row is outstanding.
    pub fn is_quick_add_pending(&self) -> bool {
        self.quick_add_pending
    }

    /// Forwards a raw field edit.
    pub fn edit(&self, field: ItemField, raw: impl Into<String>) -> RowIntent {
        RowIntent::Edit {
            item_id: self.item.id().clone(),
            field,
            raw: raw.into(),
        }
    }

    /// Forwards removal intent, or `None` when the row cannot be removed.
    pub fn remove(&self) -> Option<RowIntent> {
        self.can_remove.then(|| RowIntent::Remove {
            item_id: self.item.id().clone(),
        })
    }

    /// Asks for a new catalog product named `draft_name`.
    pub fn quick_add(&self, draft_name: impl Into<String>) -> RowIntent {
        RowIntent::QuickAdd {
            item_id: self.item.id().clone(),
            draft_name: draft_name.into(),
        }
    }
}

/// A gesture on a row, addressed to the owning editor by line id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RowIntent {
    #[serde(rename_all = "camelCase")]
    Edit {
        item_id: LineItemId,
        field: ItemField,
        raw: String,
    },
    #[serde(rename_all = "camelCase")]
    Remove { item_id: LineItemId },
    #[serde(rename_all = "camelCase")]
    QuickAdd {
        item_id: LineItemId,
        draft_name: String,
    },
}

impl RowIntent {
    /// The line the intent is addressed to.
    pub fn item_id(&self) -> &LineItemId {
        match self {
            RowIntent::Edit { item_id, .. }
            | RowIntent::Remove { item_id }
            | RowIntent::QuickAdd { item_id, .. } => item_id,
        }
    }
}
