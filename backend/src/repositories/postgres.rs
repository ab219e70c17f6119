//! PostgreSQL document store
//!
//! Each collection is a table holding the serialized document in `doc JSONB` next to
//! the columns that are looked up or constrained.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    Customer, DateRange, Paging, Product, Purchase, Quotation, Sale, SourceType, StockAdjustment,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    CustomerRepository, ProductRepository, PurchaseRepository, QuotationRepository,
    SaleRepository, StockAdjustmentRepository,
};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn to_doc<T: Serialize>(value: &T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn from_doc<T: DeserializeOwned>(doc: Value) -> AppResult<T> {
    Ok(serde_json::from_value(doc)?)
}

fn from_docs<T: DeserializeOwned>(docs: Vec<Value>) -> AppResult<Vec<T>> {
    docs.into_iter().map(from_doc).collect()
}

fn from_optional<T: DeserializeOwned>(doc: Option<Value>) -> AppResult<Option<T>> {
    doc.map(from_doc).transpose()
}

/// Unique violations become `DuplicateEntry`
fn insert_error(err: sqlx::Error, what: String) -> AppError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::DuplicateEntry(what)
        }
        other => AppError::DatabaseError(other),
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn create(&self, product: &Product) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku_id, code, category, version, doc, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id)
        .bind(&product.sku_id)
        .bind(&product.code)
        .bind(&product.category)
        .bind(product.version)
        .bind(to_doc(product)?)
        .bind(product.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| insert_error(e, format!("skuId {}", product.sku_id)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_by_sku(&self, sku_id: &str) -> AppResult<Option<Product>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM products WHERE sku_id = $1")
            .bind(sku_id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Product>> {
        let doc = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM products WHERE code = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        from_optional(doc)
    }

    async fn get_all(&self) -> AppResult<Vec<Product>> {
        let docs = sqlx::query_scalar::<_, Value>("SELECT doc FROM products ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;
        from_docs(docs)
    }

    async fn get_by_category(&self, category: &str) -> AppResult<Vec<Product>> {
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM products WHERE category = $1 ORDER BY created_at",
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;
        from_docs(docs)
    }

    async fn sku_ids(&self) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT sku_id FROM products")
            .fetch_all(&self.db)
            .await?)
    }

    async fn update(&self, product: &Product) -> AppResult<Product> {
        let mut stored = product.clone();
        stored.version += 1;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku_id = $2, code = $3, category = $4, version = $5, doc = $6
            WHERE id = $1 AND version = $7
            "#,
        )
        .bind(stored.id)
        .bind(&stored.sku_id)
        .bind(&stored.code)
        .bind(&stored.category)
        .bind(stored.version)
        .bind(to_doc(&stored)?)
        .bind(product.version)
        .execute(&self.db)
        .await
        .map_err(|e| insert_error(e, format!("skuId {}", product.sku_id)))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)",
            )
            .bind(product.id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Product".to_string()));
            }
            return Err(AppError::Conflict(format!(
                "product {} was modified concurrently",
                product.sku_id
            )));
        }

        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?)
    }
}

#[async_trait]
impl CustomerRepository for PgStore {
    async fn create(&self, customer: &Customer) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO customers (id, customer_code, doc, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(customer.id)
        .bind(&customer.customer_code)
        .bind(to_doc(customer)?)
        .bind(customer.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| insert_error(e, format!("customerCode {}", customer.customer_code)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Customer>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Customer>> {
        let doc =
            sqlx::query_scalar::<_, Value>("SELECT doc FROM customers WHERE customer_code = $1")
                .bind(code)
                .fetch_optional(&self.db)
                .await?;
        from_optional(doc)
    }

    async fn get_all(&self) -> AppResult<Vec<Customer>> {
        let docs = sqlx::query_scalar::<_, Value>("SELECT doc FROM customers ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;
        from_docs(docs)
    }

    async fn customer_codes(&self) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT customer_code FROM customers")
            .fetch_all(&self.db)
            .await?)
    }

    async fn update(&self, customer: &Customer) -> AppResult<()> {
        let result = sqlx::query("UPDATE customers SET customer_code = $2, doc = $3 WHERE id = $1")
            .bind(customer.id)
            .bind(&customer.customer_code)
            .bind(to_doc(customer)?)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.db)
            .await?)
    }
}

#[async_trait]
impl PurchaseRepository for PgStore {
    async fn create(&self, purchase: &Purchase) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO purchases (id, purchase_code, doc, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(purchase.id)
        .bind(&purchase.purchase_code)
        .bind(to_doc(purchase)?)
        .bind(purchase.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| insert_error(e, format!("purchaseCode {}", purchase.purchase_code)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Purchase>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM purchases WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_all(&self) -> AppResult<Vec<Purchase>> {
        let docs = sqlx::query_scalar::<_, Value>("SELECT doc FROM purchases ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;
        from_docs(docs)
    }

    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT purchase_code FROM purchases WHERE left(lower(purchase_code), length($1)) = lower($1)",
        )
        .bind(prefix)
        .fetch_all(&self.db)
        .await?)
    }

    async fn update(&self, purchase: &Purchase) -> AppResult<()> {
        let result = sqlx::query("UPDATE purchases SET doc = $2 WHERE id = $1")
            .bind(purchase.id)
            .bind(to_doc(purchase)?)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Purchase".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM purchases WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SaleRepository for PgStore {
    async fn create(&self, sale: &Sale) -> AppResult<()> {
        sqlx::query("INSERT INTO sales (id, sale_code, doc, created_at) VALUES ($1, $2, $3, $4)")
            .bind(sale.id)
            .bind(&sale.sale_code)
            .bind(to_doc(sale)?)
            .bind(sale.created_at)
            .execute(&self.db)
            .await
            .map_err(|e| insert_error(e, format!("saleCode {}", sale.sale_code)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Sale>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_all(&self) -> AppResult<Vec<Sale>> {
        let docs = sqlx::query_scalar::<_, Value>("SELECT doc FROM sales ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;
        from_docs(docs)
    }

    async fn codes_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT sale_code FROM sales WHERE left(lower(sale_code), length($1)) = lower($1)",
        )
        .bind(prefix)
        .fetch_all(&self.db)
        .await?)
    }

    async fn update(&self, sale: &Sale) -> AppResult<()> {
        let result = sqlx::query("UPDATE sales SET doc = $2 WHERE id = $1")
            .bind(sale.id)
            .bind(to_doc(sale)?)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl QuotationRepository for PgStore {
    async fn create(&self, quotation: &Quotation) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO quotations (id, quotation_code, doc, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(quotation.id)
        .bind(&quotation.quotation_code)
        .bind(to_doc(quotation)?)
        .bind(quotation.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| insert_error(e, format!("quotationCode {}", quotation.quotation_code)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Quotation>> {
        let doc = sqlx::query_scalar::<_, Value>("SELECT doc FROM quotations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        from_optional(doc)
    }

    async fn get_by_code(&self, code: &str) -> AppResult<Option<Quotation>> {
        let doc =
            sqlx::query_scalar::<_, Value>("SELECT doc FROM quotations WHERE quotation_code = $1")
                .bind(code)
                .fetch_optional(&self.db)
                .await?;
        from_optional(doc)
    }

    async fn get_all(&self) -> AppResult<Vec<Quotation>> {
        let docs =
            sqlx::query_scalar::<_, Value>("SELECT doc FROM quotations ORDER BY created_at")
                .fetch_all(&self.db)
                .await?;
        from_docs(docs)
    }

    async fn last_quotation_code(&self) -> AppResult<Option<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT quotation_code FROM quotations ORDER BY quotation_code DESC LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?)
    }

    async fn update(&self, quotation: &Quotation) -> AppResult<()> {
        let result = sqlx::query("UPDATE quotations SET doc = $2 WHERE id = $1")
            .bind(quotation.id)
            .bind(to_doc(quotation)?)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Quotation".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl StockAdjustmentRepository for PgStore {
    async fn create(&self, adjustment: &StockAdjustment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stock_adjustments (id, product_id, source_type, source_id, doc, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(adjustment.id)
        .bind(&adjustment.product_id)
        .bind(adjustment.source_type.as_str())
        .bind(&adjustment.source_id)
        .bind(to_doc(adjustment)?)
        .bind(adjustment.created_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StockAdjustment>> {
        let doc =
            sqlx::query_scalar::<_, Value>("SELECT doc FROM stock_adjustments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        from_optional(doc)
    }

    async fn by_product(
        &self,
        product_id: &str,
        range: Option<DateRange>,
        limit: i64,
    ) -> AppResult<Vec<StockAdjustment>> {
        let (start, end): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
            range.map_or((None, None), |r| (Some(r.start), Some(r.end)));
        let docs = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT doc FROM stock_adjustments
            WHERE product_id = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(product_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        from_docs(docs)
    }

    async fn all(&self, paging: Paging) -> AppResult<Vec<StockAdjustment>> {
        let docs = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM stock_adjustments ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(paging.limit)
        .bind(paging.skip)
        .fetch_all(&self.db)
        .await?;
        from_docs(docs)
    }

    async fn by_source(
        &self,
        source_type: SourceType,
        source_id: &str,
    ) -> AppResult<Vec<StockAdjustment>> {
        let docs = sqlx::query_scalar::<_, Value>(
            r#"
            SELECT doc FROM stock_adjustments
            WHERE source_type = $1 AND source_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(source_type.as_str())
        .bind(source_id)
        .fetch_all(&self.db)
        .await?;
        from_docs(docs)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM stock_adjustments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
