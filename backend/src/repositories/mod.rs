//! Persistence collaborators
//!
//! One trait per collection. Documents are stored whole; updates replace the document.
//! Code columns (SKU, customer, purchase, sale and quotation codes) are unique, and
//! product writes are guarded by the `version` field.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use shared::{
    Customer, DateRange, Paging, Product, Purchase, Quotation, Sale, SourceType, StockAdjustment,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppResult;

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fails with `DuplicateEntry` when the SKU is taken
    async fn create(&self, product: &Product) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn get_by_sku(&self, sku_id: &str) -> AppResult<Option<Product>>;
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Product>>;
    async fn get_all(&self) -> AppResult<Vec<Product>>;
    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Product>>;
    async fn sku_ids(&self) -> AppResult<Vec<String>>;
    /// Compare-and-swap on `version`; returns the stored document with the bumped version
    ///
    /// `NotFound` when the product is gone, `Conflict` when `product.version` is stale.
    async fn update(&self, product: &Product) -> AppResult<Product>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Fails with `DuplicateEntry` when the customer code is taken
    async fn create(&self, customer: &Customer) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>>;
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Customer>>;
    async fn get_all(&self) -> AppResult<Vec<Customer>>;
    async fn customer_codes(&self) -> AppResult<Vec<String>>;
    async fn update(&self, customer: &Customer) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
    async fn count(&self) -> AppResult<i64>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Fails with `DuplicateEntry` when the purchase code is taken
    async fn create(&self, purchase: &Purchase) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>>;
    async fn get_all(&self) -> AppResult<Vec<Purchase>>;
    /// Codes starting with `prefix`, compared case-insensitively
    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;
    async fn update(&self, purchase: &Purchase) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    /// Fails with `DuplicateEntry` when the sale code is taken
    async fn create(&self, sale: &Sale) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Sale>>;
    async fn get_all(&self) -> AppResult<Vec<Sale>>;
    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;
    async fn update(&self, sale: &Sale) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait QuotationRepository: Send + Sync {
    /// Fails with `DuplicateEntry` when the quotation code is taken
    async fn create(&self, quotation: &Quotation) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Quotation>>;
    async fn get_by_code(&self, code: &str) -> AppResult<Option<Quotation>>;
    async fn get_all(&self) -> AppResult<Vec<Quotation>>;
    /// Greatest stored quotation code, any period
    async fn last_quotation_code(&self) -> AppResult<Option<String>>;
    async fn update(&self, quotation: &Quotation) -> AppResult<()>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait StockAdjustmentRepository: Send + Sync {
    async fn create(&self, adjustment: &StockAdjustment) -> AppResult<()>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StockAdjustment>>;
    /// Newest first
    async fn by_product(
        &self,
        product_id: &str,
        range: Option<DateRange>,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>>;
    /// Newest first
    async fn all(&self, paging: Paging) -> AppResult<Vec<StockAdjustment>>;
    /// Newest first
    async fn by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> AppResult<Vec<StockAdjustment>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Every collection, behind trait objects
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub customers: Arc<dyn CustomerRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub sales: Arc<dyn SaleRepository>,
    pub quotations: Arc<dyn QuotationRepository>,
    pub adjustments: Arc<dyn StockAdjustmentRepository>,
    /// Present only for the Postgres backend
    pub pool: Option<PgPool>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool.clone()));
        Self {
            products: store.clone(),
            customers: store.clone(),
            purchases: store.clone(),
            sales: store.clone(),
            quotations: store.clone(),
            adjustments: store,
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::default());
        Self {
            products: store.clone(),
            customers: store.clone(),
            purchases: store.clone(),
            sales: store.clone(),
            quotations: store.clone(),
            adjustments: store,
            pool: None,
        }
    }

    /// Connectivity status reported by the health endpoint
    pub async fn database_status(&self) -> &'static str {
        match &self.pool {
            Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
                Ok(_) => "connected",
                Err(_) => "disconnected",
            },
            None => "memory",
        }
    }
}
