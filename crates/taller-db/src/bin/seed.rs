//! # Catalog Seed
//!
//! Populates the catalog with common workshop parts for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by TALLER_DB_PATH (default ./taller.db)
//! cargo run -p taller-db --bin seed
//!
//! # Specify database path
//! cargo run -p taller-db --bin seed -- --db ./data/taller.db
//! ```
//!
//! Parts are whole units at 21% IVA. Labour and fluids sold by the litre
//! are fractional.

use chrono::Utc;
use std::env;
use taller_core::Product;
use taller_db::{Database, DbConfig, DbError, DbLocation};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// (name, price in cents, tax rate in bps, fractional units)
const PARTS: &[(&str, i64, u32, bool)] = &[
    ("Filtro de aceite", 895, 2100, false),
    ("Filtro de aire", 1450, 2100, false),
    ("Filtro de habitaculo", 1290, 2100, false),
    ("Filtro de combustible", 2175, 2100, false),
    ("Aceite motor 5W30", 980, 2100, true),
    ("Aceite motor 10W40", 760, 2100, true),
    ("Liquido de frenos DOT4", 1120, 2100, true),
    ("Anticongelante", 540, 2100, true),
    ("Pastillas de freno delanteras", 3890, 2100, false),
    ("Pastillas de freno traseras", 3240, 2100, false),
    ("Disco de freno", 4560, 2100, false),
    ("Bujia de encendido", 675, 2100, false),
    ("Escobilla limpiaparabrisas", 1199, 2100, false),
    ("Bateria 60Ah", 8900, 2100, false),
    ("Correa de distribucion", 6480, 2100, false),
    ("Bombilla H7", 450, 2100, false),
    ("Mano de obra (hora)", 4500, 2100, true),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")))
        .with(fmt::layer())
        .init();

    let mut config = DbConfig::from_env();

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.location = DbLocation::File(path.into());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TALLER_DB_PATH or ./taller.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(config).await?;
    let repo = db.products();

    let mut inserted = 0;
    let mut skipped = 0;

    for &(name, price_cents, tax_rate_bps, fractional_units) in PARTS {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            tax_rate_bps,
            fractional_units,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match repo.insert(&product).await {
            Ok(_) => inserted += 1,
            Err(DbError::UniqueViolation { .. }) => skipped += 1,
            Err(e) => warn!(name = %name, error = %e, "Failed to insert product"),
        }
    }

    let active = repo.list_active(u32::MAX).await?.len();
    info!(inserted, skipped, active, "Seed complete");

    db.close().await;
    Ok(())
}
