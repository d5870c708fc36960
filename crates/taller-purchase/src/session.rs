//! # Purchase Session
//!
//! Connects one `PurchaseItemsEditor` to a product catalog.
//!
//! ## Thread Safety
//! The editor is wrapped in `Arc<Mutex<T>>`: the session and every
//! in-flight quick-add task write to it, one at a time. The lock is never
//! held across an `.await`, so a slow catalog cannot block editing.
//!
//! ## Quick-Add Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Quick-Add Round-Trip                                 │
//! │                                                                         │
//! │  on_quick_add_product(id, "Filtro")                                    │
//! │       │                                                                 │
//! │       ├── lock ─► editor.request_quick_add() ─► ticket ─► unlock       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tokio::spawn ──► catalog.create("Filtro")   (operator keeps editing)  │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                   lock ─► editor.resolve_quick_add(ticket, result)     │
//! │                        │                                                │
//! │                        ├── Applied ─► notice QuickAddApplied           │
//! │                        ├── Failed  ─► notice CatalogCreationFailed     │
//! │                        ├── Rejected ─► notice ValidationRejected       │
//! │                        └── Stale   ─► dropped (debug log only)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use taller_core::{
    CatalogError, CatalogResult, DispatchOutcome, EditorError, EditorNotice, EditorResult,
    ItemField, LineItem, LineItemId, ProductCatalog, ProductId, ProductSummary,
    PurchaseItemsEditor, PurchaseSubmission, PurchaseTotals, QuickAddOutcome, QuickAddTicket,
    RowIntent,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;

// =============================================================================
// Errors
// =============================================================================

/// Errors from session operations that reach the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// Snapshot
// =============================================================================

/// Everything the purchase form needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub items: Vec<LineItem>,
    pub totals: PurchaseTotals,
    /// Lines currently waiting on a quick-add.
    pub pending: Vec<LineItemId>,
}

// =============================================================================
// Session
// =============================================================================

/// One purchase being edited.
///
/// ## Usage
/// ```rust,ignore
/// let (session, mut notices) = PurchaseSession::new(Arc::new(db.products()), config);
///
/// let id = session.add_item();
/// session.handle_item_change(&id, ItemField::Quantity, "2")?;
/// let handle = session.on_quick_add_product(&id, "Filtro de aceite")?;
///
/// while let Some(notice) = notices.recv().await { /* show it */ }
/// ```
pub struct PurchaseSession {
    editor: Arc<Mutex<PurchaseItemsEditor>>,
    catalog: Arc<dyn ProductCatalog>,
    notices: mpsc::UnboundedSender<EditorNotice>,
    config: SessionConfig,
}

impl PurchaseSession {
    /// Opens a session with one blank line. Notices arrive on the returned
    /// receiver; dropping it silences them without affecting the session.
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<EditorNotice>) {
        let (notices, receiver) = mpsc::unbounded_channel();
        info!(
            quick_add_timeout = ?config.quick_add_timeout,
            currency = %config.currency_code,
            "Opening purchase session"
        );

        let session = PurchaseSession {
            editor: Arc::new(Mutex::new(PurchaseItemsEditor::new())),
            catalog,
            notices,
            config,
        };
        (session, receiver)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn editor(&self) -> MutexGuard<'_, PurchaseItemsEditor> {
        lock(&self.editor)
    }

    /// Forwards the notice of a failed operation to the form.
    fn forward<T>(&self, result: EditorResult<T>) -> EditorResult<T> {
        if let Err(err) = &result {
            debug!(error = %err, "Editor rejected operation");
            if let Some(notice) = err.notice() {
                let _ = self.notices.send(notice);
            }
        }
        result
    }

    // -------------------------------------------------------------------------
    // Synchronous edits
    // -------------------------------------------------------------------------

    pub fn add_item(&self) -> LineItemId {
        let id = self.editor().add_item();
        debug!(item_id = %id, "Added line item");
        id
    }

    pub fn remove_item(&self, id: &LineItemId) -> EditorResult<LineItem> {
        let result = self.editor().remove_item(id);
        if result.is_ok() {
            debug!(item_id = %id, "Removed line item");
        }
        self.forward(result)
    }

    pub fn handle_item_change(
        &self,
        id: &LineItemId,
        field: ItemField,
        raw: &str,
    ) -> EditorResult<()> {
        let result = self.editor().handle_item_change(id, field, raw);
        if result.is_ok() {
            debug!(item_id = %id, field = %field, "Edited line item");
        }
        self.forward(result)
    }

    /// Applies a row message. A quick-add intent starts the catalog
    /// round-trip in the background; a product typed into the row is looked
    /// up in the catalog before it is attached.
    pub async fn dispatch(&self, intent: RowIntent) -> SessionResult<DispatchOutcome> {
        if let RowIntent::Edit {
            item_id,
            field: ItemField::Product,
            raw,
        } = &intent
        {
            let product_id = raw.trim();
            if !product_id.is_empty() {
                self.select_product(item_id, &ProductId::new(product_id))
                    .await?;
                return Ok(DispatchOutcome::Edited);
            }
        }

        let result = self.editor().dispatch(intent);
        let outcome = self.forward(result)?;

        if let DispatchOutcome::QuickAddRequested(ticket) = &outcome {
            let _ = self.spawn_quick_add(ticket.clone());
        }
        Ok(outcome)
    }

    // -------------------------------------------------------------------------
    // Catalog-backed edits
    // -------------------------------------------------------------------------

    /// Looks the product up and attaches it to the line.
    ///
    /// The line is located again after the lookup, so a line removed in the
    /// meantime yields `ItemNotFound`.
    pub async fn select_product(&self, id: &LineItemId, product_id: &ProductId) -> SessionResult<()> {
        let product = match self.catalog.lookup(product_id).await {
            Ok(product) => product,
            Err(e) => {
                warn!(item_id = %id, product_id = %product_id, error = %e, "Product lookup failed");
                return Err(e.into());
            }
        };

        let result = self.editor().select_product(id, &product);
        self.forward(result)?;
        debug!(item_id = %id, product_id = %product_id, "Selected product");
        Ok(())
    }

    /// Creates a product from `draft_name` and attaches it to the line once
    /// the catalog answers.
    ///
    /// Returns as soon as the request is registered. The handle resolves to
    /// what happened; awaiting it is optional. Must be called from within a
    /// tokio runtime.
    pub fn on_quick_add_product(
        &self,
        id: &LineItemId,
        draft_name: &str,
    ) -> EditorResult<JoinHandle<QuickAddOutcome>> {
        let result = self.editor().request_quick_add(id, draft_name);
        let ticket = self.forward(result)?;
        Ok(self.spawn_quick_add(ticket))
    }

    fn spawn_quick_add(&self, ticket: QuickAddTicket) -> JoinHandle<QuickAddOutcome> {
        debug!(item_id = %ticket.item_id, draft_name = %ticket.draft_name, "Quick-add requested");

        let editor = Arc::downgrade(&self.editor);
        let catalog = Arc::clone(&self.catalog);
        let notices = self.notices.clone();
        let timeout = self.config.quick_add_timeout;

        tokio::spawn(async move {
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, catalog.create(&ticket.draft_name))
                    .await
                    .unwrap_or(Err(CatalogError::TimedOut)),
                None => catalog.create(&ticket.draft_name).await,
            };
            resolve(&editor, &notices, &ticket, result)
        })
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        let editor = self.editor();
        let items = editor.items().to_vec();
        let pending = items
            .iter()
            .filter(|item| editor.is_quick_add_pending(item.id()))
            .map(|item| item.id().clone())
            .collect();

        SessionSnapshot {
            items,
            totals: editor.totals(),
            pending,
        }
    }

    pub fn totals(&self) -> PurchaseTotals {
        self.editor().totals()
    }

    /// Builds the payload for the caller to persist.
    pub fn submission(&self) -> EditorResult<PurchaseSubmission> {
        let result = self.editor().submission();
        self.forward(result)
    }

    /// Discards the purchase. Quick-adds still in flight resolve as stale.
    pub fn close(self) {
        info!("Closing purchase session");
    }
}

fn lock(editor: &Mutex<PurchaseItemsEditor>) -> MutexGuard<'_, PurchaseItemsEditor> {
    editor.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resolve(
    editor: &Weak<Mutex<PurchaseItemsEditor>>,
    notices: &mpsc::UnboundedSender<EditorNotice>,
    ticket: &QuickAddTicket,
    result: CatalogResult<ProductSummary>,
) -> QuickAddOutcome {
    let Some(editor) = editor.upgrade() else {
        debug!(item_id = %ticket.item_id, "Session closed before quick-add resolved");
        return QuickAddOutcome::Stale;
    };

    let outcome = lock(&editor).resolve_quick_add(ticket, result);
    match &outcome {
        QuickAddOutcome::Applied { product_id, .. } => {
            info!(item_id = %ticket.item_id, product_id = %product_id, "Quick-add applied");
        }
        QuickAddOutcome::Failed { error, .. } => {
            warn!(item_id = %ticket.item_id, draft_name = %ticket.draft_name, error = %error, "Quick-add failed");
        }
        QuickAddOutcome::Rejected {
            product_id,
            field,
            error,
            ..
        } => {
            warn!(item_id = %ticket.item_id, product_id = %product_id, field = %field, error = %error, "Quick-add product does not fit the line");
        }
        QuickAddOutcome::Stale => {
            debug!(item_id = %ticket.item_id, "Dropped stale quick-add resolution");
        }
    }

    if let Some(notice) = outcome.notice() {
        let _ = notices.send(notice);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;
    use taller_core::{Money, ProductRef, Quantity, TaxRate};
    use tokio::sync::oneshot;

    /// Catalog whose `create` answers only when the test says so.
    #[derive(Default)]
    struct GatedCatalog {
        gates: std::sync::Mutex<VecDeque<oneshot::Receiver<CatalogResult<ProductSummary>>>>,
        products: HashMap<ProductId, ProductSummary>,
    }

    impl GatedCatalog {
        fn gate(&self) -> oneshot::Sender<CatalogResult<ProductSummary>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().push_back(rx);
            tx
        }
    }

    #[async_trait]
    impl ProductCatalog for GatedCatalog {
        async fn lookup(&self, id: &ProductId) -> CatalogResult<ProductSummary> {
            self.products
                .get(id)
                .cloned()
                .ok_or_else(|| CatalogError::NotFound(id.clone()))
        }

        async fn create(&self, _draft_name: &str) -> CatalogResult<ProductSummary> {
            let gate = self.gates.lock().unwrap().pop_front();
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(CatalogError::Unavailable("gate dropped".into()))),
                None => Err(CatalogError::Unavailable("no gate".into())),
            }
        }
    }

    fn summary(id: &str, name: &str, price_cents: i64, pct: u32) -> ProductSummary {
        ProductSummary {
            id: ProductId::new(id),
            name: name.to_string(),
            default_unit_price: Money::from_cents(price_cents),
            tax_rate: TaxRate::from_percent(pct),
            fractional_units: false,
        }
    }

    fn open(
        catalog: Arc<GatedCatalog>,
    ) -> (PurchaseSession, mpsc::UnboundedReceiver<EditorNotice>) {
        PurchaseSession::new(catalog, SessionConfig::default())
    }

    fn first_id(session: &PurchaseSession) -> LineItemId {
        session.snapshot().items[0].id().clone()
    }

    #[tokio::test]
    async fn test_quick_add_applies_and_notifies() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Filtro de aceite").unwrap();
        assert_eq!(session.snapshot().pending, vec![id.clone()]);

        gate.send(Ok(summary("p-1", "Filtro de aceite", 895, 21))).unwrap();
        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, QuickAddOutcome::Applied { .. }));

        let snapshot = session.snapshot();
        let item = &snapshot.items[0];
        assert_eq!(item.product_ref(), &ProductRef::Catalog(ProductId::new("p-1")));
        assert_eq!(item.unit_price(), Money::from_cents(895));
        assert!(snapshot.pending.is_empty());

        assert_eq!(
            notices.recv().await,
            Some(EditorNotice::QuickAddApplied {
                item_id: id,
                product_id: ProductId::new("p-1"),
            })
        );
    }

    #[tokio::test]
    async fn test_removal_while_pending_is_stale() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let first = first_id(&session);
        let second = session.add_item();

        let handle = session.on_quick_add_product(&first, "Bujia").unwrap();
        session.remove_item(&first).unwrap();

        gate.send(Ok(summary("p-2", "Bujia", 675, 21))).unwrap();
        assert_eq!(handle.await.unwrap(), QuickAddOutcome::Stale);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id(), &second);
        assert!(snapshot.items[0].product_ref().is_unset());
        assert!(notices.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_edits_do_not_wait_for_catalog() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, _notices) = open(catalog);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Disco de freno").unwrap();

        session.handle_item_change(&id, ItemField::Quantity, "2").unwrap();
        session.handle_item_change(&id, ItemField::UnitPrice, "40").unwrap();
        assert_eq!(session.totals().subtotal, Money::from_cents(8_000));

        gate.send(Ok(summary("p-3", "Disco de freno", 4_560, 21))).unwrap();
        assert!(matches!(handle.await.unwrap(), QuickAddOutcome::Applied { .. }));

        let item = session.snapshot().items[0].clone();
        assert_eq!(item.unit_price(), Money::from_cents(4_000));
        assert_eq!(item.tax_rate(), TaxRate::from_percent(21));
        assert_eq!(session.totals().subtotal, Money::from_cents(8_000));
    }

    #[tokio::test]
    async fn test_failure_emits_notice() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Correa").unwrap();
        gate.send(Err(CatalogError::CreationFailed("disk full".into())))
            .unwrap();

        assert!(matches!(handle.await.unwrap(), QuickAddOutcome::Failed { .. }));
        assert!(session.snapshot().items[0].product_ref().is_unset());

        match notices.recv().await {
            Some(EditorNotice::CatalogCreationFailed {
                item_id,
                draft_name,
                ..
            }) => {
                assert_eq!(item_id, id);
                assert_eq!(draft_name, "Correa");
            }
            other => panic!("unexpected notice: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_quick_add_times_out() {
        let catalog = Arc::new(GatedCatalog::default());
        let _gate = catalog.gate();
        let config = SessionConfig {
            quick_add_timeout: Some(Duration::from_millis(20)),
            ..SessionConfig::default()
        };
        let (session, _notices) = PurchaseSession::new(catalog, config);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Bateria").unwrap();
        match handle.await.unwrap() {
            QuickAddOutcome::Failed { error, .. } => assert_eq!(error, CatalogError::TimedOut),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_drops_late_resolution() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Anticongelante").unwrap();
        session.close();

        gate.send(Ok(summary("p-4", "Anticongelante", 540, 21))).unwrap();
        assert_eq!(handle.await.unwrap(), QuickAddOutcome::Stale);
        assert_eq!(notices.recv().await, None);
    }

    #[tokio::test]
    async fn test_removal_denied_notice() {
        let (session, mut notices) = open(Arc::new(GatedCatalog::default()));
        let id = first_id(&session);

        assert_eq!(
            session.remove_item(&id),
            Err(EditorError::RemovalDenied(id.clone()))
        );
        assert_eq!(
            notices.try_recv().ok(),
            Some(EditorNotice::RemovalDenied { item_id: id })
        );
        assert_eq!(session.snapshot().items.len(), 1);
    }

    #[tokio::test]
    async fn test_select_product_from_catalog() {
        let mut catalog = GatedCatalog::default();
        let oil = summary("p-oil", "Aceite 5W30", 980, 21);
        catalog.products.insert(oil.id.clone(), oil.clone());
        let (session, _notices) = open(Arc::new(catalog));
        let id = first_id(&session);

        session.select_product(&id, &oil.id).await.unwrap();
        assert_eq!(session.snapshot().items[0].unit_price(), Money::from_cents(980));

        let missing = ProductId::new("ghost");
        assert_eq!(
            session.select_product(&id, &missing).await,
            Err(SessionError::Catalog(CatalogError::NotFound(missing)))
        );
    }

    #[tokio::test]
    async fn test_dispatch_quick_add_intent() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let id = first_id(&session);

        let row_intent = {
            let editor = session.editor();
            let row = editor.rows().next().unwrap();
            row.quick_add("Bombilla H7")
        };
        let outcome = session.dispatch(row_intent).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::QuickAddRequested(_)));

        gate.send(Ok(summary("p-5", "Bombilla H7", 450, 21))).unwrap();
        assert_eq!(
            notices.recv().await,
            Some(EditorNotice::QuickAddApplied {
                item_id: id,
                product_id: ProductId::new("p-5"),
            })
        );
    }

    #[tokio::test]
    async fn test_dispatch_product_edit_goes_through_catalog() {
        let mut catalog = GatedCatalog::default();
        let pads = summary("p-pads", "Pastillas de freno", 3_450, 21);
        catalog.products.insert(pads.id.clone(), pads.clone());
        let (session, _notices) = open(Arc::new(catalog));
        let id = first_id(&session);

        let typed = |raw: &str| RowIntent::Edit {
            item_id: id.clone(),
            field: ItemField::Product,
            raw: raw.to_string(),
        };

        let missing = ProductId::new("does-not-exist");
        assert_eq!(
            session.dispatch(typed("does-not-exist")).await,
            Err(SessionError::Catalog(CatalogError::NotFound(missing)))
        );
        assert!(session.snapshot().items[0].product_ref().is_unset());
        assert_eq!(
            session.submission().unwrap_err(),
            EditorError::IncompleteItem(id.clone())
        );

        assert_eq!(
            session.dispatch(typed(" p-pads ")).await,
            Ok(DispatchOutcome::Edited)
        );
        let item = session.snapshot().items[0].clone();
        assert_eq!(item.product_ref(), &ProductRef::Catalog(pads.id.clone()));
        assert_eq!(item.product_name(), Some("Pastillas de freno"));
        assert_eq!(item.unit_price(), Money::from_cents(3_450));

        assert_eq!(session.dispatch(typed("")).await, Ok(DispatchOutcome::Edited));
        assert!(session.snapshot().items[0].product_ref().is_unset());
    }

    #[tokio::test]
    async fn test_rejected_quick_add_emits_notice() {
        let mut catalog = GatedCatalog::default();
        let mut coolant = summary("p-cool", "Refrigerante", 650, 21);
        coolant.fractional_units = true;
        catalog.products.insert(coolant.id.clone(), coolant.clone());
        let catalog = Arc::new(catalog);
        let gate = catalog.gate();
        let (session, mut notices) = open(catalog);
        let id = first_id(&session);

        session.select_product(&id, &coolant.id).await.unwrap();
        let handle = session.on_quick_add_product(&id, "Tapon").unwrap();
        session.handle_item_change(&id, ItemField::Quantity, "1.75").unwrap();

        gate.send(Ok(summary("p-cap", "Tapon", 300, 21))).unwrap();
        assert!(matches!(
            handle.await.unwrap(),
            QuickAddOutcome::Rejected {
                field: ItemField::Quantity,
                ..
            }
        ));

        let item = session.snapshot().items[0].clone();
        assert_eq!(item.product_ref(), &ProductRef::Catalog(coolant.id.clone()));
        assert_eq!(item.quantity(), Quantity::from_milli(1_750));
        assert!(matches!(
            notices.recv().await,
            Some(EditorNotice::ValidationRejected {
                field: ItemField::Quantity,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_submission_waits_for_quick_add() {
        let catalog = Arc::new(GatedCatalog::default());
        let gate = catalog.gate();
        let (session, _notices) = open(catalog);
        let id = first_id(&session);

        let handle = session.on_quick_add_product(&id, "Escobilla").unwrap();
        assert_eq!(
            session.submission().unwrap_err(),
            EditorError::QuickAddPending(id.clone())
        );

        gate.send(Ok(summary("p-6", "Escobilla", 1_199, 21))).unwrap();
        handle.await.unwrap();

        let submission = session.submission().unwrap();
        assert_eq!(submission.lines.len(), 1);
        assert_eq!(submission.totals.subtotal, Money::from_cents(1_199));
    }
}
