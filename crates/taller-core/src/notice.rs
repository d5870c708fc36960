//! # Editor Notices
//!
//! Structured events for whoever displays messages to the operator.
//! The core never shows a toast itself; the purchase form decides how and
//! whether each notice is presented.

use serde::Serialize;
use ts_rs::TS;

use crate::error::EditorError;
use crate::types::{ItemField, LineItemId, ProductId};

/// A recoverable event the operator may want to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EditorNotice {
    /// An edit was rejected and the prior value kept.
    #[serde(rename_all = "camelCase")]
    ValidationRejected {
        item_id: LineItemId,
        field: ItemField,
        message: String,
    },

    /// The last remaining line cannot be removed.
    #[serde(rename_all = "camelCase")]
    RemovalDenied { item_id: LineItemId },

    /// A quick-add failed; the row keeps no product and may retry.
    #[serde(rename_all = "camelCase")]
    CatalogCreationFailed {
        item_id: LineItemId,
        draft_name: String,
        message: String,
    },

    /// A quick-added product was attached to its row.
    #[serde(rename_all = "camelCase")]
    QuickAddApplied {
        item_id: LineItemId,
        product_id: ProductId,
    },
}

impl EditorNotice {
    /// The line item this notice concerns.
    pub fn item_id(&self) -> &LineItemId {
        match self {
            EditorNotice::ValidationRejected { item_id, .. }
            | EditorNotice::RemovalDenied { item_id }
            | EditorNotice::CatalogCreationFailed { item_id, .. }
            | EditorNotice::QuickAddApplied { item_id, .. } => item_id,
        }
    }
}

impl EditorError {
    /// Maps an error to the notice shown to the operator, if any.
    ///
    /// Unknown ids are not surfaced: they come from rows that no longer
    /// exist on screen.
    pub fn notice(&self) -> Option<EditorNotice> {
        match self {
            EditorError::ValidationRejected {
                item_id,
                field,
                source,
            } => Some(EditorNotice::ValidationRejected {
                item_id: item_id.clone(),
                field: *field,
                message: source.to_string(),
            }),
            EditorError::RemovalDenied(item_id) => Some(EditorNotice::RemovalDenied {
                item_id: item_id.clone(),
            }),
            EditorError::ItemNotFound(_)
            | EditorError::IncompleteItem(_)
            | EditorError::QuickAddPending(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_validation_error_becomes_notice() {
        let id = LineItemId::generate();
        let err = EditorError::ValidationRejected {
            item_id: id.clone(),
            field: ItemField::UnitPrice,
            source: ValidationError::Negative {
                field: "unit price".to_string(),
            },
        };

        let notice = err.notice().unwrap();
        assert_eq!(notice.item_id(), &id);
        assert_eq!(
            notice,
            EditorNotice::ValidationRejected {
                item_id: id,
                field: ItemField::UnitPrice,
                message: "unit price cannot be negative".to_string(),
            }
        );
    }

    #[test]
    fn test_not_found_is_silent() {
        assert!(EditorError::ItemNotFound(LineItemId::generate())
            .notice()
            .is_none());
    }

    #[test]
    fn test_notice_json_shape() {
        let id = LineItemId::generate();
        let notice = EditorNotice::RemovalDenied {
            item_id: id.clone(),
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "removalDenied");
        assert_eq!(json["itemId"], id.as_str());
    }
}
