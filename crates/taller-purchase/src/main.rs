//! # Headless Purchase Form
//!
//! Drives a purchase session over stdin/stdout, one JSON message per line.
//!
//! ## Protocol
//! ```text
//! stdin                                          stdout
//! ─────                                          ──────
//! {"kind":"edit","itemId":..,"field":..,"raw":..} {"snapshot":{..}}
//! {"kind":"remove","itemId":..}                   {"error":".."}
//! {"kind":"quickAdd","itemId":..,"draftName":..}  {"notice":{..}}
//! {"kind":"addItem"}
//! {"kind":"selectProduct","itemId":..,"productId":..}
//! {"kind":"submit"}                               {"submission":{..}}
//! ```
//!
//! Logs go to stderr. At end of input, outstanding quick-adds are awaited
//! before the final snapshot is printed.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use taller_core::{LineItemId, ProductId, QuickAddOutcome, RowIntent};
use taller_db::{Database, DbConfig};
use taller_purchase::telemetry::init_tracing;
use taller_purchase::{PurchaseSession, SessionConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Messages that are not row intents.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum FormCommand {
    AddItem,
    #[serde(rename_all = "camelCase")]
    SelectProduct {
        item_id: LineItemId,
        product_id: ProductId,
    },
    Submit,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let db = Database::new(DbConfig::from_env()).await?;
    let (session, mut notices) =
        PurchaseSession::new(Arc::new(db.products()), SessionConfig::from_env());

    let printer = tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            println!("{}", json!({ "notice": notice }));
        }
    });

    let mut in_flight: Vec<JoinHandle<QuickAddOutcome>> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Ok(intent) = serde_json::from_str::<RowIntent>(line) {
            let result = match intent {
                RowIntent::QuickAdd {
                    item_id,
                    draft_name,
                } => session
                    .on_quick_add_product(&item_id, &draft_name)
                    .map(|handle| in_flight.push(handle))
                    .map_err(|e| e.to_string()),
                other => session
                    .dispatch(other)
                    .await
                    .map(|_| ())
                    .map_err(|e| e.to_string()),
            };
            report(&session, result);
            continue;
        }

        match serde_json::from_str::<FormCommand>(line) {
            Ok(FormCommand::AddItem) => {
                session.add_item();
                report(&session, Ok(()));
            }
            Ok(FormCommand::SelectProduct {
                item_id,
                product_id,
            }) => {
                let result = session.select_product(&item_id, &product_id).await;
                report(&session, result.map_err(|e| e.to_string()));
            }
            Ok(FormCommand::Submit) => match session.submission() {
                Ok(submission) => println!("{}", json!({ "submission": submission })),
                Err(e) => println!("{}", json!({ "error": e.to_string() })),
            },
            Err(e) => {
                warn!(error = %e, "Unrecognised message");
                println!("{}", json!({ "error": e.to_string() }));
            }
        }
    }

    for handle in in_flight {
        if let Err(e) = handle.await {
            warn!(error = %e, "Quick-add task failed");
        }
    }
    report(&session, Ok(()));

    info!("Input closed");
    session.close();
    printer.await?;
    db.close().await;
    Ok(())
}

fn report(session: &PurchaseSession, result: Result<(), String>) {
    match result {
        Ok(()) => println!("{}", json!({ "snapshot": session.snapshot() })),
        Err(e) => println!("{}", json!({ "error": e })),
    }
}
