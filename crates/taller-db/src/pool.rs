//! # Catalog Connection
//!
//! Opens the SQLite catalog and hands out repositories.
//!
//! ```text
//!   DbConfig::from_env()          TALLER_DB_PATH, TALLER_DEFAULT_TAX_RATE
//!          │
//!          ▼
//!   Database::new(config) ──► pool ──► migrations (unless disabled)
//!          │
//!          ▼
//!   db.products() ──► ProductRepository: ProductCatalog
//! ```
//!
//! File databases run in WAL mode so catalog lookups from the purchase form
//! never wait on a quick-add insert.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use taller_core::validation::parse_tax_rate;
use taller_core::TaxRate;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;

/// Path used when `TALLER_DB_PATH` is not set.
pub const DEFAULT_DB_PATH: &str = "taller.db";

/// Tax rate applied to quick-added products: the general IVA rate.
pub const DEFAULT_TAX_RATE: TaxRate = TaxRate::from_percent(21);

// =============================================================================
// Configuration
// =============================================================================

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to one connection; gone when the pool closes.
    Memory,
}

/// Catalog database settings.
///
/// ```rust,ignore
/// let config = DbConfig::file("./data/taller.db")
///     .max_connections(8)
///     .default_tax_rate(TaxRate::from_percent(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Apply pending migrations when connecting.
    pub run_migrations: bool,
    /// Tax rate given to products created by quick-add.
    pub default_tax_rate: TaxRate,
}

impl DbConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            run_migrations: true,
            default_tax_rate: DEFAULT_TAX_RATE,
        }
    }

    /// A throwaway catalog for tests. SQLite memory databases are
    /// per-connection, so the pool is pinned to one.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            ..DbConfig::file(DEFAULT_DB_PATH)
        }
    }

    /// Reads `TALLER_DB_PATH` and `TALLER_DEFAULT_TAX_RATE` (a percentage,
    /// e.g. "10" or "5,5"). Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let path = std::env::var("TALLER_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        let mut config = DbConfig::file(path);

        if let Ok(raw) = std::env::var("TALLER_DEFAULT_TAX_RATE") {
            match parse_tax_rate(&raw) {
                Ok(rate) => config.default_tax_rate = rate,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring TALLER_DEFAULT_TAX_RATE"),
            }
        }

        config
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn default_tax_rate(mut self, rate: TaxRate) -> Self {
        self.default_tax_rate = rate;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:"),
            DbLocation::File(path) => {
                SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display())).map(|o| {
                    o.create_if_missing(true)
                        .journal_mode(SqliteJournalMode::Wal)
                        .synchronous(SqliteSynchronous::Normal)
                })
            }
        }
        .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        Ok(options.foreign_keys(true))
    }
}

// =============================================================================
// Database
// =============================================================================

/// An open catalog database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    default_tax_rate: TaxRate,
}

impl Database {
    /// Opens the pool and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening catalog database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Catalog pool ready");

        let db = Database {
            pool,
            default_tax_rate: config.default_tax_rate,
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The product catalog. Cheap: repositories share the pool.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.default_tax_rate)
    }

    /// True when the database answers `SELECT 1`.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }

    pub async fn close(&self) {
        info!("Closing catalog database");
        self.pool.close().await;
    }
}
