//! # Product Repository
//!
//! Database operations for the workshop product catalog.
//!
//! ## Key Operations
//! - Lookup by ID for product selection on a purchase row
//! - Draft creation for quick-add
//! - Case-insensitive name lookup (one active product per name)
//!
//! ## Quick-Add Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Draft Product Is Created                       │
//! │                                                                         │
//! │  Operator types: "pastillas freno"                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_product_name ──► Err → CatalogError::CreationFailed          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  find_by_name (NOCASE) ──► Some(existing) → reuse it                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT price 0, default tax rate                                      │
//! │       │                                                                 │
//! │       ├── UNIQUE constraint failed (concurrent insert) → re-fetch      │
//! │       ▼                                                                 │
//! │  ProductSummary → editor.resolve_quick_add                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use taller_core::validation::validate_product_name;
use taller_core::{
    CatalogError, CatalogResult, Product, ProductCatalog, ProductId, ProductSummary, TaxRate,
    ValidationError,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, tax_rate_bps, fractional_units, \
     is_active, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw `products` row as SQLite returns it.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    name: String,
    price_cents: i64,
    tax_rate_bps: i64,
    fractional_units: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        let tax_rate_bps = u32::try_from(row.tax_rate_bps).map_err(|_| {
            DbError::Validation(ValidationError::OutOfRange {
                field: "tax_rate_bps".to_string(),
                min: 0,
                max: 10_000,
            })
        })?;

        Ok(Product {
            id: row.id,
            name: row.name,
            price_cents: row.price_cents,
            tax_rate_bps,
            fractional_units: row.fractional_units,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.get_by_id("uuid-here").await?;
/// let draft = repo.create_draft("Filtro de aceite").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    default_tax_rate: TaxRate,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, default_tax_rate: TaxRate) -> Self {
        ProductRepository {
            pool,
            default_tax_rate,
        }
    }

    /// Tax rate given to products created by quick-add.
    pub fn default_tax_rate(&self) -> TaxRate {
        self.default_tax_rate
    }

    /// Gets a product by its ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Finds the active product with this name, ignoring case and
    /// surrounding whitespace.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE name = ?1 COLLATE NOCASE AND is_active = 1",
            PRODUCT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name COLLATE NOCASE LIMIT ?1",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - An active product already has this name
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, price_cents, tax_rate_bps, fractional_units,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(i64::from(product.tax_rate_bps))
        .bind(product.fractional_units)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: product.name.clone(),
            },
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Soft-deletes a product. Purchase rows that already reference it keep
    /// their snapshot; new lookups report it as not found.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Creates a draft product for quick-add: zero price, default tax rate,
    /// whole units. An existing active product with the same name is reused.
    pub async fn create_draft(&self, draft_name: &str) -> DbResult<Product> {
        validate_product_name(draft_name)?;
        let name = draft_name.trim();

        if let Some(existing) = self.find_by_name(name).await? {
            debug!(id = %existing.id, name = %name, "Reusing existing product for quick-add");
            return Ok(existing);
        }

        let now = Utc::now();
        let draft = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents: 0,
            tax_rate_bps: self.default_tax_rate.bps(),
            fractional_units: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        match self.insert(&draft).await {
            Ok(product) => {
                info!(id = %product.id, name = %product.name, "Created draft product");
                Ok(product)
            }
            // Lost a race with another insert of the same name.
            Err(DbError::UniqueViolation { .. }) => self
                .find_by_name(name)
                .await?
                .ok_or_else(|| DbError::not_found("Product", name)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ProductCatalog for ProductRepository {
    async fn lookup(&self, id: &ProductId) -> CatalogResult<ProductSummary> {
        match self.get_by_id(id.as_str()).await? {
            Some(product) if product.is_active => Ok(product.summary()),
            _ => Err(CatalogError::NotFound(id.clone())),
        }
    }

    async fn create(&self, draft_name: &str) -> CatalogResult<ProductSummary> {
        let product = self.create_draft(draft_name).await?;
        Ok(product.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use taller_core::Money;

    async fn repo() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    fn product(name: &str, price_cents: i64, tax_rate_bps: u32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            tax_rate_bps,
            fractional_units: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let repo = repo().await;
        let oil = product("Aceite 5W30", 1250, 2100);
        repo.insert(&oil).await.unwrap();

        let summary = repo.lookup(&ProductId::new(oil.id.clone())).await.unwrap();
        assert_eq!(summary.name, "Aceite 5W30");
        assert_eq!(summary.default_unit_price, Money::from_cents(1250));
        assert_eq!(summary.tax_rate, TaxRate::from_percent(21));
    }

    #[tokio::test]
    async fn test_lookup_missing_and_inactive() {
        let repo = repo().await;

        let missing = ProductId::new("nope");
        assert_eq!(
            repo.lookup(&missing).await,
            Err(CatalogError::NotFound(missing.clone()))
        );

        let old = product("Bujia antigua", 300, 2100);
        repo.insert(&old).await.unwrap();
        repo.deactivate(&old.id).await.unwrap();

        let id = ProductId::new(old.id.clone());
        assert_eq!(repo.lookup(&id).await, Err(CatalogError::NotFound(id.clone())));
    }

    #[tokio::test]
    async fn test_create_draft_uses_defaults() {
        let repo = repo().await;

        let summary = repo.create("  Pastillas freno  ").await.unwrap();
        assert_eq!(summary.name, "Pastillas freno");
        assert_eq!(summary.default_unit_price, Money::zero());
        assert_eq!(summary.tax_rate, TaxRate::from_percent(21));
        assert!(!summary.fractional_units);
    }

    #[tokio::test]
    async fn test_create_draft_reuses_same_name() {
        let repo = repo().await;

        let first = repo.create("Filtro de aire").await.unwrap();
        let second = repo.create("FILTRO DE AIRE").await.unwrap();
        assert_eq!(first.id, second.id);

        assert_eq!(repo.list_active(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_draft_rejects_blank_name() {
        let repo = repo().await;

        let err = repo.create("   ").await.unwrap_err();
        assert!(matches!(err, CatalogError::CreationFailed(_)));
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_unique_violation() {
        let repo = repo().await;
        repo.insert(&product("Liquido frenos", 800, 2100)).await.unwrap();

        let err = repo
            .insert(&product("liquido FRENOS", 900, 2100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deactivate_missing_is_not_found() {
        let repo = repo().await;
        let err = repo.deactivate("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
